//! Virtual clock.
//!
//! No system time is read anywhere in the runtime. The clock moves forward only
//! when a timer fires (it jumps to the timer's due time) or when synchronous
//! work is charged to it, which keeps every trace reproducible.

use std::time::Duration;

/// A monotonic virtual clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualClock {
    now: Duration,
}

impl VirtualClock {
    /// A clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since the loop started.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Moves the clock to `target`; never moves backwards.
    pub fn advance_to(&mut self, target: Duration) {
        if target > self.now {
            self.now = target;
        }
    }

    /// Moves the clock forward by `elapsed`.
    pub fn advance_by(&mut self, elapsed: Duration) {
        self.now = self.now.saturating_add(elapsed);
    }
}

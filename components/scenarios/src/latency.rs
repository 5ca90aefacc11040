//! Simulated network latency.
//!
//! The scenarios stand in for network calls with timers of random length.
//! Randomness comes from a seeded generator so a given seed always yields the
//! same trace.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 2020;

/// Shared, seeded source of random delays.
#[derive(Clone, Debug)]
pub struct Latency {
    rng: Rc<RefCell<StdRng>>,
}

impl Latency {
    /// A generator seeded with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Rc::new(RefCell::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// A random delay in `[0, max_ms)` milliseconds.
    pub fn up_to(&self, max_ms: u64) -> Duration {
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.borrow_mut().random_range(0..max_ms))
    }

    /// `Math.random()`.
    pub fn fraction(&self) -> f64 {
        self.rng.borrow_mut().random::<f64>()
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::seeded(DEFAULT_SEED)
    }
}

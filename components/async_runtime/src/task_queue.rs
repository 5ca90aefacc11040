//! Microtask and timer queue management.
//!
//! Microtasks run in strict FIFO order. Timers are kept in a min-heap keyed by
//! due time, with the registration sequence breaking ties so that two timers
//! due at the same instant fire in the order they were scheduled.

use core_types::JsError;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::time::Duration;

type Callback = Box<dyn FnOnce() -> Result<(), JsError>>;

/// A microtask to be executed by the event loop.
///
/// Microtasks carry promise reactions and `queueMicrotask` callbacks. A
/// microtask that returns `Err` is an uncaught exception.
pub struct MicroTask {
    callback: Callback,
}

impl MicroTask {
    /// Creates a new MicroTask from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), JsError> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the microtask.
    pub fn run(self) -> Result<(), JsError> {
        (self.callback)()
    }
}

impl std::fmt::Debug for MicroTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MicroTask {{ ... }}")
    }
}

/// A queue for microtasks.
///
/// Drained completely, including microtasks enqueued while draining, before
/// any timer runs.
#[derive(Debug, Default)]
pub struct MicrotaskQueue {
    queue: VecDeque<MicroTask>,
}

impl MicrotaskQueue {
    /// Creates a new empty MicrotaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a microtask to the end of the queue.
    pub fn enqueue(&mut self, microtask: MicroTask) {
        self.queue.push_back(microtask);
    }

    /// Removes and returns the next microtask from the queue.
    pub fn dequeue(&mut self) -> Option<MicroTask> {
        self.queue.pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of microtasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drops every queued microtask.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Identifier returned by `set_timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// A callback scheduled to run once the virtual clock reaches `due`.
pub struct Timer {
    /// Registration order, unique per event loop
    pub id: TimerId,
    /// Virtual time at which the timer becomes runnable
    pub due: Duration,
    callback: Callback,
}

impl Timer {
    /// Creates a timer.
    pub fn new<F>(id: TimerId, due: Duration, f: F) -> Self
    where
        F: FnOnce() -> Result<(), JsError> + 'static,
    {
        Self {
            id,
            due,
            callback: Box::new(f),
        }
    }

    /// Executes the timer callback.
    pub fn run(self) -> Result<(), JsError> {
        (self.callback)()
    }

    fn key(&self) -> (Duration, TimerId) {
        (self.due, self.id)
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("due", &self.due)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    // Reversed so the max-heap pops the earliest (due, id) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// A queue for timers, ordered by due time then registration order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Timer>,
}

impl TimerQueue {
    /// Creates a new empty TimerQueue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Adds a timer.
    pub fn schedule(&mut self, timer: Timer) {
        self.heap.push(timer);
    }

    /// Removes and returns the earliest timer.
    pub fn pop(&mut self) -> Option<Timer> {
        self.heap.pop()
    }

    /// Due time of the earliest timer, if any.
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|t| t.due)
    }

    /// Returns true if no timer is scheduled.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the number of scheduled timers.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Drops every scheduled timer.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

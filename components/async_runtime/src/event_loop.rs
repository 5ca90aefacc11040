//! Event loop implementation.
//!
//! This module provides the scheduler every scenario runs on. It is a
//! single-threaded, cooperative loop; work runs in three phases:
//!
//! 1. The synchronous phase: whatever the caller runs before
//!    [`EventLoop::run_until_done`]. Nothing deferred can interrupt it.
//! 2. The microtask tier: promise reactions and resumed async routines, FIFO,
//!    drained completely (including work queued while draining).
//! 3. The timer tier: callbacks from [`EventLoop::set_timeout`], ordered by due
//!    time then registration order. Each timer is followed by a full microtask
//!    checkpoint.
//!
//! At the end of every checkpoint, rejected promises that still have no
//! reaction are reported on the error stream. The report names the rejection
//! reason only; where the promise came from is not known to the loop.

use crate::clock::VirtualClock;
use crate::console::{Console, ConsoleWriter, Stream, TraceLine};
use crate::error::RuntimeError;
use crate::promise::{Promise, PromiseState, Resolvers};
use crate::task_queue::{MicroTask, MicrotaskQueue, Timer, TimerId, TimerQueue};
use core_types::{ErrorKind, JsError, StackFrame, Value};
use parking_lot::Mutex;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;
use tracing::{debug, trace};

type RoutineFuture = Pin<Box<dyn Future<Output = Result<Value, JsError>>>>;

/// An async routine parked at a suspend point.
struct Routine {
    future: RoutineFuture,
    resolvers: Resolvers,
}

/// Wakes a routine by queueing its id for the scheduler.
///
/// `Waker` must be `Send + Sync`, so only the id crosses into it; the routine
/// itself stays on the loop.
struct RoutineWaker {
    id: u64,
    woken: Arc<Mutex<VecDeque<u64>>>,
}

impl Wake for RoutineWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.woken.lock().push_back(self.id);
    }
}

#[derive(Default)]
struct RejectionTracker {
    /// Rejected with no reaction at settlement time; checked at checkpoint.
    candidates: Vec<Promise>,
    /// Promises that gained a reaction after being reported.
    handled_late: Vec<u64>,
}

struct LoopInner {
    microtasks: RefCell<MicrotaskQueue>,
    timers: RefCell<TimerQueue>,
    clock: RefCell<VirtualClock>,
    call_stack: RefCell<Vec<StackFrame>>,
    console: Console,
    rejections: RefCell<RejectionTracker>,
    routines: RefCell<HashMap<u64, Routine>>,
    woken: Arc<Mutex<VecDeque<u64>>>,
    next_timer_id: Cell<u64>,
    next_routine_id: Cell<u64>,
    next_promise_id: Cell<u64>,
}

/// The event loop.
///
/// `EventLoop` is a cheap handle: clones share the same queues, clock and
/// console, so timer callbacks and promise handlers can capture one and keep
/// scheduling work.
///
/// # Examples
///
/// ```
/// use async_runtime::EventLoop;
/// use std::time::Duration;
///
/// let event_loop = EventLoop::new();
/// let el = event_loop.clone();
/// event_loop.set_timeout(Duration::from_millis(5), move || {
///     el.log("timer");
///     Ok(())
/// });
/// event_loop.log("sync");
/// event_loop.run_until_done().unwrap();
/// assert_eq!(event_loop.stdout(), vec!["sync", "timer"]);
/// ```
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<LoopInner>,
}

/// Non-owning handle held by promises.
#[derive(Clone, Default)]
pub struct WeakEventLoop(Weak<LoopInner>);

impl WeakEventLoop {
    /// Returns the loop if it is still alive.
    pub fn upgrade(&self) -> Option<EventLoop> {
        self.0.upgrade().map(|inner| EventLoop { inner })
    }
}

impl EventLoop {
    /// Creates an event loop whose console only records.
    pub fn new() -> Self {
        Self::with_console(Console::new())
    }

    /// Creates an event loop whose console mirrors lines to `writer`.
    pub fn with_writer(writer: Box<dyn ConsoleWriter>) -> Self {
        Self::with_console(Console::with_writer(writer))
    }

    fn with_console(console: Console) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                microtasks: RefCell::new(MicrotaskQueue::new()),
                timers: RefCell::new(TimerQueue::new()),
                clock: RefCell::new(VirtualClock::new()),
                call_stack: RefCell::new(Vec::new()),
                console,
                rejections: RefCell::new(RejectionTracker::default()),
                routines: RefCell::new(HashMap::new()),
                woken: Arc::new(Mutex::new(VecDeque::new())),
                next_timer_id: Cell::new(0),
                next_routine_id: Cell::new(0),
                next_promise_id: Cell::new(1),
            }),
        }
    }

    /// Returns a non-owning handle.
    pub fn downgrade(&self) -> WeakEventLoop {
        WeakEventLoop(Rc::downgrade(&self.inner))
    }

    // ----------------------------------------------------------------------
    // Console
    // ----------------------------------------------------------------------

    /// `console.log`.
    pub fn log(&self, message: impl fmt::Display) {
        self.write(Stream::Stdout, message.to_string());
    }

    /// `console.error`; also used for runtime diagnostics.
    pub fn log_error(&self, message: impl fmt::Display) {
        self.write(Stream::Stderr, message.to_string());
    }

    fn write(&self, stream: Stream, text: String) {
        let at_ms = u64::try_from(self.now().as_millis()).unwrap_or(u64::MAX);
        self.inner.console.write(stream, text, at_ms);
    }

    /// Every line written so far, both streams interleaved.
    pub fn trace(&self) -> Vec<TraceLine> {
        self.inner.console.lines()
    }

    /// Lines written with [`EventLoop::log`].
    pub fn stdout(&self) -> Vec<String> {
        self.inner.console.texts(Stream::Stdout)
    }

    /// Diagnostics and [`EventLoop::log_error`] lines.
    pub fn stderr(&self) -> Vec<String> {
        self.inner.console.texts(Stream::Stderr)
    }

    // ----------------------------------------------------------------------
    // Clock
    // ----------------------------------------------------------------------

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.clock.borrow().now()
    }

    /// Charges synchronous work to the clock.
    ///
    /// The loop cannot run anything while the caller is busy, so timers that
    /// fall due during this time fire late.
    pub fn burn_cpu(&self, elapsed: Duration) {
        self.inner.clock.borrow_mut().advance_by(elapsed);
    }

    // ----------------------------------------------------------------------
    // Call stack
    // ----------------------------------------------------------------------

    /// Runs `f` with a frame named `name` on the call stack.
    pub fn call<T>(&self, name: &str, f: impl FnOnce() -> T) -> T {
        self.inner
            .call_stack
            .borrow_mut()
            .push(StackFrame::named(name));
        let result = f();
        self.inner.call_stack.borrow_mut().pop();
        result
    }

    /// Frames currently on the stack, innermost first.
    pub fn stack(&self) -> Vec<StackFrame> {
        self.inner.call_stack.borrow().iter().rev().cloned().collect()
    }

    /// Creates an error that captures the current call stack, like `new Error`.
    pub fn new_error(&self, kind: ErrorKind, message: impl Into<String>) -> JsError {
        JsError::new(kind, message).with_stack(self.stack())
    }

    fn with_stack<T>(&self, frames: Vec<StackFrame>, f: impl FnOnce() -> T) -> T {
        let saved = self.inner.call_stack.replace(frames);
        let result = f();
        *self.inner.call_stack.borrow_mut() = saved;
        result
    }

    // ----------------------------------------------------------------------
    // Scheduling
    // ----------------------------------------------------------------------

    /// Adds a microtask to the microtask queue.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.inner.microtasks.borrow_mut().enqueue(microtask);
    }

    /// `queueMicrotask(callback)`.
    pub fn queue_microtask<F>(&self, callback: F)
    where
        F: FnOnce() -> Result<(), JsError> + 'static,
    {
        self.enqueue_microtask(MicroTask::new(callback));
    }

    /// `setTimeout(callback, delay)`.
    ///
    /// The callback becomes runnable at `now + delay` and never runs before
    /// the current synchronous phase and microtask tier have finished, even
    /// with a zero delay.
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() -> Result<(), JsError> + 'static,
    {
        let id = TimerId(self.inner.next_timer_id.get());
        self.inner.next_timer_id.set(id.0 + 1);
        let due = self.now().saturating_add(delay);
        trace!(timer = id.0, due_ms = due.as_millis() as u64, "timer scheduled");
        self.inner
            .timers
            .borrow_mut()
            .schedule(Timer::new(id, due, callback));
        id
    }

    /// Starts an async routine and returns the promise of its result.
    ///
    /// The routine is polled immediately, so everything up to its first
    /// suspend point runs before `spawn` returns. The rest runs in the
    /// microtask tier. An `Err` from the routine rejects the returned promise
    /// and is never seen by the caller's synchronous error handling.
    pub fn spawn<F>(&self, routine: F) -> Promise
    where
        F: Future<Output = Result<Value, JsError>> + 'static,
    {
        let (promise, resolvers) = Promise::with_resolvers(self);
        let id = self.inner.next_routine_id.get();
        self.inner.next_routine_id.set(id + 1);
        self.inner.routines.borrow_mut().insert(
            id,
            Routine {
                future: Box::pin(routine),
                resolvers,
            },
        );
        self.poll_routine(id);
        promise
    }

    fn poll_routine(&self, id: u64) {
        let routine = self.inner.routines.borrow_mut().remove(&id);
        let Some(mut routine) = routine else {
            // Already finished; a late wake is harmless.
            return;
        };
        let waker = Waker::from(Arc::new(RoutineWaker {
            id,
            woken: self.inner.woken.clone(),
        }));
        let mut cx = Context::from_waker(&waker);
        match routine.future.as_mut().poll(&mut cx) {
            Poll::Ready(outcome) => {
                trace!(routine = id, ok = outcome.is_ok(), "routine finished");
                routine.resolvers.settle(outcome);
            }
            Poll::Pending => {
                self.inner.routines.borrow_mut().insert(id, routine);
            }
        }
    }

    fn resume_woken(&self) {
        loop {
            let next = self.inner.woken.lock().pop_front();
            let Some(id) = next else { break };
            trace!(routine = id, "resuming routine");
            self.poll_routine(id);
        }
    }

    pub(crate) fn next_promise_id(&self) -> u64 {
        let id = self.inner.next_promise_id.get();
        self.inner.next_promise_id.set(id + 1);
        id
    }

    // ----------------------------------------------------------------------
    // Rejection tracking
    // ----------------------------------------------------------------------

    pub(crate) fn track_rejection(&self, promise: Promise) {
        trace!(promise = promise.id(), "rejection without handler");
        self.inner.rejections.borrow_mut().candidates.push(promise);
    }

    pub(crate) fn rejection_handled_late(&self, promise_id: u64) {
        self.inner
            .rejections
            .borrow_mut()
            .handled_late
            .push(promise_id);
    }

    fn report_rejections(&self) {
        let (candidates, handled_late) = {
            let mut tracker = self.inner.rejections.borrow_mut();
            (
                std::mem::take(&mut tracker.candidates),
                std::mem::take(&mut tracker.handled_late),
            )
        };
        for promise in candidates {
            if !promise.mark_reported() {
                continue;
            }
            if let PromiseState::Rejected(reason) = promise.state() {
                debug!(promise = promise.id(), "unhandled rejection");
                self.log_error(format!("UnhandledPromiseRejectionWarning: {}", reason));
            }
        }
        for promise_id in handled_late {
            debug!(promise = promise_id, "rejection handled late");
            self.log_error(
                "PromiseRejectionHandledWarning: Promise rejection was handled asynchronously",
            );
        }
    }

    // ----------------------------------------------------------------------
    // Running
    // ----------------------------------------------------------------------

    /// Returns true if no microtask is queued.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.inner.microtasks.borrow().is_empty()
    }

    /// Number of timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Runs all microtasks in the queue until empty, then reports unhandled
    /// rejections.
    ///
    /// Microtasks added during execution are processed before this returns.
    /// A routine woken by a reaction resumes right after that reaction.
    pub fn run_all_microtasks(&self) -> Result<(), RuntimeError> {
        let frames = vec![StackFrame::named("processTicksAndRejections")
            .in_source("internal/process/task_queues.js")];
        loop {
            self.resume_woken();
            let next = self.inner.microtasks.borrow_mut().dequeue();
            let Some(microtask) = next else { break };
            self.with_stack(frames.clone(), || microtask.run())
                .map_err(|error| self.uncaught(error))?;
        }
        self.report_rejections();
        Ok(())
    }

    /// Processes one complete cycle: the earliest timer followed by all
    /// microtasks. Returns `false` when no timer was left to run.
    pub fn process_one_cycle(&self) -> Result<bool, RuntimeError> {
        let next = self.inner.timers.borrow_mut().pop();
        let Some(timer) = next else {
            return Ok(false);
        };
        self.inner.clock.borrow_mut().advance_to(timer.due);
        trace!(
            timer = timer.id.0,
            now_ms = self.now().as_millis() as u64,
            "timer fired"
        );
        self.with_stack(timer_frames(), || timer.run())
            .map_err(|error| self.uncaught(error))?;
        self.run_all_microtasks()?;
        Ok(true)
    }

    /// Runs the loop until no microtask or timer is left.
    ///
    /// Call this after the synchronous phase. An uncaught exception stops the
    /// loop the way it would end a process: the stack trace is written to the
    /// error stream, pending work is dropped and the error is returned.
    pub fn run_until_done(&self) -> Result<(), RuntimeError> {
        let result = self.drive();
        if result.is_err() {
            self.shutdown();
        }
        result
    }

    fn drive(&self) -> Result<(), RuntimeError> {
        self.run_all_microtasks()?;
        while self.process_one_cycle()? {}
        debug!(now_ms = self.now().as_millis() as u64, "event loop drained");
        Ok(())
    }

    /// Reports an error nothing caught and returns it as a runtime error.
    pub fn uncaught(&self, error: JsError) -> RuntimeError {
        debug!(error = %error, "uncaught exception");
        self.log_error(format!("Uncaught {}", error.stack_trace()));
        RuntimeError::Uncaught(error)
    }

    /// Drops all queued work, parked routines and tracked rejections.
    ///
    /// Queued callbacks commonly hold clones of this loop; clearing them
    /// breaks those reference cycles.
    pub fn shutdown(&self) {
        self.inner.microtasks.borrow_mut().clear();
        self.inner.timers.borrow_mut().clear();
        let routines = std::mem::take(&mut *self.inner.routines.borrow_mut());
        drop(routines);
        self.inner.woken.lock().clear();
        *self.inner.rejections.borrow_mut() = RejectionTracker::default();
    }
}

fn timer_frames() -> Vec<StackFrame> {
    vec![
        StackFrame::named("processTimers").in_source("internal/timers.js"),
        StackFrame::named("listOnTimeout").in_source("internal/timers.js"),
        StackFrame::named("Timeout._onTimeout"),
    ]
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("now", &self.now())
            .field("microtasks", &self.inner.microtasks.borrow().len())
            .field("timers", &self.inner.timers.borrow().len())
            .field("routines", &self.inner.routines.borrow().len())
            .finish()
    }
}

//! Promise implementation.
//!
//! A [`Promise`] is a shared handle to a one-shot state machine:
//! `Pending → Fulfilled(value)` or `Pending → Rejected(error)`. Reactions
//! registered with [`Promise::then`] and friends never run inline; they are
//! queued as microtasks on the owning [`EventLoop`], either at settlement or,
//! if the promise has already settled, at registration.
//!
//! Awaiting a promise inside a routine started with [`EventLoop::spawn`]
//! registers a reaction that resumes the routine, so an `.await` is exactly a
//! continuation registered through `then`.

use crate::event_loop::{EventLoop, WeakEventLoop};
use crate::task_queue::MicroTask;
use core_types::{JsError, Value};
use std::cell::RefCell;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use tracing::trace;

/// Handler run when a promise fulfills.
pub type OnFulfilled = Box<dyn FnOnce(Value) -> Result<Value, JsError>>;

/// Handler run when a promise rejects.
pub type OnRejected = Box<dyn FnOnce(JsError) -> Result<Value, JsError>>;

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled(Value),
    /// The promise has been rejected with an error.
    Rejected(JsError),
}

impl PromiseState {
    /// Returns `true` if the promise is no longer pending.
    pub fn is_settled(&self) -> bool {
        !matches!(self, PromiseState::Pending)
    }

    fn outcome(&self) -> Option<Result<Value, JsError>> {
        match self {
            PromiseState::Pending => None,
            PromiseState::Fulfilled(v) => Some(Ok(v.clone())),
            PromiseState::Rejected(e) => Some(Err(e.clone())),
        }
    }
}

/// A reaction to be triggered when a Promise settles.
///
/// This represents the handlers registered via `.then()`, together with the
/// derived promise their result settles.
pub struct PromiseReaction {
    /// The promise resolved or rejected by this reaction
    pub derived: Promise,
    /// Handler for fulfilled state
    pub on_fulfilled: Option<OnFulfilled>,
    /// Handler for rejected state
    pub on_rejected: Option<OnRejected>,
}

impl PromiseReaction {
    /// Runs the matching handler and settles the derived promise.
    ///
    /// A missing handler passes the outcome through unchanged; a handler
    /// returning `Err` rejects the derived promise.
    fn run(self, outcome: Result<Value, JsError>) {
        let next = match outcome {
            Ok(value) => match self.on_fulfilled {
                Some(handler) => handler(value),
                None => Ok(value),
            },
            Err(error) => match self.on_rejected {
                Some(handler) => handler(error),
                None => Err(error),
            },
        };
        self.derived.settle(next);
    }
}

impl fmt::Debug for PromiseReaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseReaction")
            .field("derived", &self.derived.id())
            .field("on_fulfilled", &self.on_fulfilled.is_some())
            .field("on_rejected", &self.on_rejected.is_some())
            .finish()
    }
}

struct PromiseInner {
    id: u64,
    state: PromiseState,
    reactions: Vec<PromiseReaction>,
    /// Some reaction has been registered, so a rejection is observed.
    handled: bool,
    /// The unhandled-rejection warning has been emitted for this promise.
    reported: bool,
}

/// A JavaScript Promise.
///
/// Cloning a `Promise` clones the handle; both clones observe the same state.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Promise, PromiseState};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let promise = Promise::resolved(&event_loop, Value::Smi(42));
/// assert_eq!(promise.state(), PromiseState::Fulfilled(Value::Smi(42)));
///
/// let log = event_loop.clone();
/// promise.then(move |v| {
///     log.log(format!("got {}", v));
///     Ok(Value::Undefined)
/// });
/// // Nothing runs until the microtask tier drains.
/// assert!(event_loop.stdout().is_empty());
/// event_loop.run_until_done().unwrap();
/// assert_eq!(event_loop.stdout(), vec!["got 42"]);
/// ```
#[derive(Clone)]
pub struct Promise {
    inner: Rc<RefCell<PromiseInner>>,
    event_loop: WeakEventLoop,
}

impl Promise {
    /// Creates a promise and runs `executor` synchronously before returning.
    ///
    /// The executor receives the [`Resolvers`]; it may settle the promise at
    /// once or hand the resolvers to a timer. If the executor itself returns
    /// `Err`, the promise is rejected with that error (a no-op if the executor
    /// already settled it).
    pub fn new<F>(event_loop: &EventLoop, executor: F) -> Promise
    where
        F: FnOnce(Resolvers) -> Result<(), JsError>,
    {
        let (promise, resolvers) = Promise::with_resolvers(event_loop);
        if let Err(error) = executor(resolvers.clone()) {
            resolvers.reject(error);
        }
        promise
    }

    /// Creates a pending promise and returns its resolvers alongside it.
    pub fn with_resolvers(event_loop: &EventLoop) -> (Promise, Resolvers) {
        let promise = Promise {
            inner: Rc::new(RefCell::new(PromiseInner {
                id: event_loop.next_promise_id(),
                state: PromiseState::Pending,
                reactions: Vec::new(),
                handled: false,
                reported: false,
            })),
            event_loop: event_loop.downgrade(),
        };
        let resolvers = Resolvers {
            promise: promise.clone(),
        };
        (promise, resolvers)
    }

    /// `Promise.resolve(value)`.
    pub fn resolved(event_loop: &EventLoop, value: Value) -> Promise {
        let (promise, resolvers) = Promise::with_resolvers(event_loop);
        resolvers.resolve(value);
        promise
    }

    /// `Promise.reject(error)`.
    pub fn rejected(event_loop: &EventLoop, error: JsError) -> Promise {
        let (promise, resolvers) = Promise::with_resolvers(event_loop);
        resolvers.reject(error);
        promise
    }

    /// Identifier unique within the owning event loop.
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Current state.
    pub fn state(&self) -> PromiseState {
        self.inner.borrow().state.clone()
    }

    /// Returns true while the promise has not settled.
    pub fn is_pending(&self) -> bool {
        !self.inner.borrow().state.is_settled()
    }

    /// Returns true once any reaction has been registered.
    pub fn is_handled(&self) -> bool {
        self.inner.borrow().handled
    }

    /// Registers a fulfillment handler; rejections pass through.
    pub fn then<F>(&self, on_fulfilled: F) -> Promise
    where
        F: FnOnce(Value) -> Result<Value, JsError> + 'static,
    {
        self.add_reaction(Some(Box::new(on_fulfilled)), None)
    }

    /// Registers both handlers, like `then(onFulfilled, onRejected)`.
    pub fn then_with<F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise
    where
        F: FnOnce(Value) -> Result<Value, JsError> + 'static,
        R: FnOnce(JsError) -> Result<Value, JsError> + 'static,
    {
        self.add_reaction(Some(Box::new(on_fulfilled)), Some(Box::new(on_rejected)))
    }

    /// Registers a rejection handler only; fulfillment passes through.
    pub fn catch<R>(&self, on_rejected: R) -> Promise
    where
        R: FnOnce(JsError) -> Result<Value, JsError> + 'static,
    {
        self.add_reaction(None, Some(Box::new(on_rejected)))
    }

    /// Adds handlers for fulfillment and/or rejection.
    ///
    /// Returns the derived promise the handlers' result settles. The reaction
    /// is queued as a microtask immediately if this promise has settled, and
    /// at settlement otherwise; it never runs before this call returns.
    pub fn add_reaction(
        &self,
        on_fulfilled: Option<OnFulfilled>,
        on_rejected: Option<OnRejected>,
    ) -> Promise {
        let derived = match self.event_loop.upgrade() {
            Some(event_loop) => Promise::with_resolvers(&event_loop).0,
            None => Promise::detached(),
        };
        let reaction = PromiseReaction {
            derived: derived.clone(),
            on_fulfilled,
            on_rejected,
        };

        let settled = {
            let mut inner = self.inner.borrow_mut();
            let first_late_handler = inner.reported && !inner.handled;
            inner.handled = true;
            if first_late_handler {
                // Only rejected promises are ever reported.
                if let Some(event_loop) = self.event_loop.upgrade() {
                    event_loop.rejection_handled_late(inner.id);
                }
            }
            match inner.state.outcome() {
                Some(outcome) => Some((outcome, reaction)),
                None => {
                    inner.reactions.push(reaction);
                    None
                }
            }
        };

        if let Some((outcome, reaction)) = settled {
            self.enqueue_reaction(reaction, outcome);
        }
        derived
    }

    /// Settles the promise. Returns `false` if it had already settled.
    pub(crate) fn settle(&self, outcome: Result<Value, JsError>) -> bool {
        let (id, reactions, unobserved) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_settled() {
                trace!(promise = inner.id, "ignoring second settlement");
                return false;
            }
            inner.state = match &outcome {
                Ok(value) => PromiseState::Fulfilled(value.clone()),
                Err(error) => PromiseState::Rejected(error.clone()),
            };
            let unobserved = outcome.is_err() && !inner.handled;
            (inner.id, std::mem::take(&mut inner.reactions), unobserved)
        };
        trace!(
            promise = id,
            fulfilled = outcome.is_ok(),
            reactions = reactions.len(),
            "promise settled"
        );

        if unobserved {
            if let Some(event_loop) = self.event_loop.upgrade() {
                event_loop.track_rejection(self.clone());
            }
        }
        for reaction in reactions {
            self.enqueue_reaction(reaction, outcome.clone());
        }
        true
    }

    pub(crate) fn mark_reported(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.handled || inner.reported {
            return false;
        }
        inner.reported = true;
        true
    }

    fn enqueue_reaction(&self, reaction: PromiseReaction, outcome: Result<Value, JsError>) {
        if let Some(event_loop) = self.event_loop.upgrade() {
            event_loop.enqueue_microtask(MicroTask::new(move || {
                reaction.run(outcome);
                Ok(())
            }));
        }
    }

    /// A promise whose event loop is gone; it can settle but never reacts.
    fn detached() -> Promise {
        Promise {
            inner: Rc::new(RefCell::new(PromiseInner {
                id: 0,
                state: PromiseState::Pending,
                reactions: Vec::new(),
                handled: false,
                reported: false,
            })),
            event_loop: WeakEventLoop::default(),
        }
    }

    /// What `String(promise)` gives in JavaScript.
    pub fn to_js_string(&self) -> String {
        "[object Promise]".to_string()
    }
}

/// Renders the promise the way `console.log(promise)` does in Node.
impl fmt::Display for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.borrow().state {
            PromiseState::Pending => write!(f, "Promise {{ <pending> }}"),
            PromiseState::Fulfilled(value) => write!(f, "Promise {{ {} }}", value),
            PromiseState::Rejected(error) => write!(f, "Promise {{ <rejected> {} }}", error),
        }
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Promise")
            .field("id", &inner.id)
            .field("state", &inner.state)
            .field("reactions", &inner.reactions.len())
            .finish()
    }
}

/// The `resolve`/`reject` pair handed to a promise executor.
#[derive(Clone, Debug)]
pub struct Resolvers {
    promise: Promise,
}

impl Resolvers {
    /// Fulfills the promise. Returns `false` if it had already settled.
    pub fn resolve(&self, value: Value) -> bool {
        self.promise.settle(Ok(value))
    }

    /// Rejects the promise. Returns `false` if it had already settled.
    pub fn reject(&self, error: JsError) -> bool {
        self.promise.settle(Err(error))
    }

    /// Settles with either outcome.
    pub fn settle(&self, outcome: Result<Value, JsError>) -> bool {
        self.promise.settle(outcome)
    }
}

type Slot = Rc<RefCell<Option<Result<Value, JsError>>>>;

/// Future returned by `promise.await`.
///
/// The first poll always registers a reaction and returns `Pending`, even for
/// a settled promise, so the code after the suspend point runs in the
/// microtask tier.
pub struct Awaited {
    promise: Promise,
    slot: Slot,
    registered: bool,
}

impl Future for Awaited {
    type Output = Result<Value, JsError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.slot.borrow_mut().take() {
            return Poll::Ready(outcome);
        }
        if !self.registered {
            self.registered = true;
            let (ok_slot, err_slot) = (self.slot.clone(), self.slot.clone());
            let (ok_waker, err_waker) = (cx.waker().clone(), cx.waker().clone());
            self.promise.add_reaction(
                Some(Box::new(move |value| {
                    *ok_slot.borrow_mut() = Some(Ok(value));
                    ok_waker.wake();
                    Ok(Value::Undefined)
                })),
                Some(Box::new(move |error| {
                    *err_slot.borrow_mut() = Some(Err(error));
                    err_waker.wake();
                    Ok(Value::Undefined)
                })),
            );
        }
        Poll::Pending
    }
}

impl IntoFuture for Promise {
    type Output = Result<Value, JsError>;
    type IntoFuture = Awaited;

    fn into_future(self) -> Awaited {
        Awaited {
            promise: self,
            slot: Rc::new(RefCell::new(None)),
            registered: false,
        }
    }
}

impl IntoFuture for &Promise {
    type Output = Result<Value, JsError>;
    type IntoFuture = Awaited;

    fn into_future(self) -> Awaited {
        self.clone().into_future()
    }
}

//! Scenario library.
//!
//! Each [`Scenario`] demonstrates one ordering or error-propagation behaviour
//! of a single-threaded event loop: callback nesting, promise settlement,
//! starvation by synchronous work, suspend points and the errors that slip
//! past them. Scenarios share nothing; every run gets a fresh [`Lab`].
//!
//! # Examples
//!
//! ```
//! use scenarios::{find, Lab};
//!
//! let scenario = find("then-after-timer").unwrap();
//! let lab = Lab::new(2020);
//! scenario.execute(&lab).unwrap();
//! assert_eq!(lab.stdout()[0], "Started!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod async_await;
mod callbacks;
mod ordering;
mod promises;

pub mod latency;

pub use latency::{Latency, DEFAULT_SEED};

use async_runtime::{ConsoleWriter, EventLoop, Promise, RuntimeError};
use core_types::{JsError, Value};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// The four groups scenarios are organised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chapter {
    /// Completion callbacks and their nesting
    Callbacks,
    /// Promise construction, `then` and `catch`
    Promises,
    /// Synchronous ordering, call stacks and the event loop
    EventLoop,
    /// Async routines and suspend points
    AsyncAwait,
}

impl Chapter {
    /// All chapters in presentation order.
    pub const ALL: [Chapter; 4] = [
        Chapter::Callbacks,
        Chapter::Promises,
        Chapter::EventLoop,
        Chapter::AsyncAwait,
    ];

    /// Identifier used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Chapter::Callbacks => "callbacks",
            Chapter::Promises => "promises",
            Chapter::EventLoop => "event-loop",
            Chapter::AsyncAwait => "async-await",
        }
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a chapter name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown chapter '{0}'")]
pub struct UnknownChapter(pub String);

impl FromStr for Chapter {
    type Err = UnknownChapter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chapter::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownChapter(s.to_string()))
    }
}

/// Everything a scenario body runs against: the event loop and a seeded
/// latency source. Cloning shares both.
#[derive(Clone, Debug)]
pub struct Lab {
    event_loop: EventLoop,
    latency: Latency,
}

impl Lab {
    /// A lab with a recording-only console.
    pub fn new(seed: u64) -> Self {
        Self::with_event_loop(EventLoop::new(), seed)
    }

    /// A lab whose console mirrors lines to `writer` as they are produced.
    pub fn with_writer(writer: Box<dyn ConsoleWriter>, seed: u64) -> Self {
        Self::with_event_loop(EventLoop::with_writer(writer), seed)
    }

    fn with_event_loop(event_loop: EventLoop, seed: u64) -> Self {
        Self {
            event_loop,
            latency: Latency::seeded(seed),
        }
    }

    /// The event loop.
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// A random delay below `max_ms`, standing in for network latency.
    pub fn random_delay(&self, max_ms: u64) -> Duration {
        self.latency.up_to(max_ms)
    }

    /// `Math.random()`.
    pub fn random(&self) -> f64 {
        self.latency.fraction()
    }

    /// A promise fulfilled with `value` after `delay`.
    pub fn sleep(&self, delay: Duration, value: Value) -> Promise {
        let el = self.event_loop.clone();
        Promise::new(&self.event_loop, move |resolvers| {
            el.set_timeout(delay, move || {
                resolvers.resolve(value);
                Ok(())
            });
            Ok(())
        })
    }
}

impl Deref for Lab {
    type Target = EventLoop;

    fn deref(&self) -> &EventLoop {
        &self.event_loop
    }
}

/// Signature of a scenario body.
pub type ScenarioFn = fn(&Lab) -> Result<(), JsError>;

/// A named, self-contained demonstration.
pub struct Scenario {
    /// Identifier used on the command line
    pub name: &'static str,
    /// Chapter the scenario belongs to
    pub chapter: Chapter,
    /// One-line description
    pub summary: &'static str,
    /// Name of the outermost frame on the call stack while the body runs
    pub entry: &'static str,
    body: ScenarioFn,
}

impl Scenario {
    const fn new(
        name: &'static str,
        chapter: Chapter,
        entry: &'static str,
        summary: &'static str,
        body: ScenarioFn,
    ) -> Self {
        Self {
            name,
            chapter,
            summary,
            entry,
            body,
        }
    }

    /// Runs only the synchronous phase.
    pub fn run(&self, lab: &Lab) -> Result<(), JsError> {
        lab.call(self.entry, || (self.body)(lab))
    }

    /// Runs the synchronous phase, then the event loop until it is empty.
    ///
    /// An error escaping the synchronous phase is uncaught: it is reported and
    /// nothing deferred runs, as when a script throws at top level.
    pub fn execute(&self, lab: &Lab) -> Result<(), RuntimeError> {
        debug!(scenario = self.name, "running scenario");
        if let Err(error) = self.run(lab) {
            let failure = lab.uncaught(error);
            lab.shutdown();
            return Err(failure);
        }
        let result = lab.run_until_done();
        lab.shutdown();
        result
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("chapter", &self.chapter)
            .finish_non_exhaustive()
    }
}

static CATALOG: [Scenario; 29] = [
    // callbacks
    Scenario::new(
        "callback-hell",
        Chapter::Callbacks,
        "callbackHell",
        "four services called one after another through nested callbacks",
        callbacks::callback_hell,
    ),
    Scenario::new(
        "callback-hell-numbered",
        Chapter::Callbacks,
        "callbackHell",
        "numbered prints show the last line of the function running first",
        callbacks::callback_hell_numbered,
    ),
    Scenario::new(
        "callback-parallel",
        Chapter::Callbacks,
        "callbackHell",
        "three services called in parallel finish in latency order",
        callbacks::callback_parallel,
    ),
    // promises
    Scenario::new(
        "promise-pending",
        Chapter::Promises,
        "promiseLand",
        "a pending promise is just an object",
        promises::promise_pending,
    ),
    Scenario::new(
        "promise-unhandled-reject",
        Chapter::Promises,
        "promiseLand",
        "a rejection nobody observes ends in a warning",
        promises::promise_unhandled_reject,
    ),
    Scenario::new(
        "promise-then",
        Chapter::Promises,
        "promiseLand",
        "a then handler runs after the promise resolves",
        promises::promise_then,
    ),
    Scenario::new(
        "promise-catch",
        Chapter::Promises,
        "promiseLand",
        "a catch handler runs after the promise rejects",
        promises::promise_catch,
    ),
    Scenario::new(
        "promise-throw-in-timer",
        Chapter::Promises,
        "promiseLand",
        "a throw inside a timer is not a rejection, so catch never runs",
        promises::promise_throw_in_timer,
    ),
    // event loop
    Scenario::new(
        "sync-order",
        Chapter::EventLoop,
        "eventLoop",
        "synchronous statements run in order",
        ordering::sync_order,
    ),
    Scenario::new(
        "sync-error-stack",
        Chapter::EventLoop,
        "eventLoop",
        "a caught synchronous error carries a useful call stack",
        ordering::sync_error_stack,
    ),
    Scenario::new(
        "nested-error-stack",
        Chapter::EventLoop,
        "eventLoop",
        "the call stack survives however deep the throw is",
        ordering::nested_error_stack,
    ),
    Scenario::new(
        "try-around-definitions",
        Chapter::EventLoop,
        "eventLoop",
        "guarding where functions are defined does not guard their calls",
        ordering::try_around_definitions,
    ),
    Scenario::new(
        "try-around-rejection",
        Chapter::EventLoop,
        "eventLoop",
        "try/catch does not catch a rejected promise",
        ordering::try_around_rejection,
    ),
    Scenario::new(
        "try-around-timer",
        Chapter::EventLoop,
        "eventLoop",
        "try/catch does not catch a throw inside a timer",
        ordering::try_around_timer,
    ),
    Scenario::new(
        "then-after-timer",
        Chapter::EventLoop,
        "eventLoop",
        "code after a pending promise runs before its then handler",
        ordering::then_after_timer,
    ),
    Scenario::new(
        "busy-loop-starvation",
        Chapter::EventLoop,
        "eventLoop",
        "a busy loop keeps a resolved promise's handler waiting",
        ordering::busy_loop_starvation,
    ),
    Scenario::new(
        "lost-stack-trace",
        Chapter::EventLoop,
        "eventLoop",
        "a timer's stack trace does not say which caller scheduled it",
        ordering::lost_stack_trace,
    ),
    Scenario::new(
        "which-call-failed",
        Chapter::EventLoop,
        "eventLoop",
        "catch handlers on three lookups cannot see a throw inside a timer",
        ordering::which_call_failed,
    ),
    // async/await
    Scenario::new(
        "async-returns-promise",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "an async function returns a promise even when it finishes at once",
        async_await::async_returns_promise,
    ),
    Scenario::new(
        "async-sum",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "adding two async results concatenates two promises",
        async_await::async_sum,
    ),
    Scenario::new(
        "async-then-order",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "a then on an async result runs after the caller finishes",
        async_await::async_then_order,
    ),
    Scenario::new(
        "await-value",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "await unwraps the value of an async result",
        async_await::await_value,
    ),
    Scenario::new(
        "await-try-catch",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "an awaited rejection is caught where it is awaited",
        async_await::await_try_catch,
    ),
    Scenario::new(
        "await-mixed-catch",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "a catch handler and an awaited failure interleave 1 to 5",
        async_await::await_mixed_catch,
    ),
    Scenario::new(
        "unawaited-rejection",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "a failing async call that is not awaited escapes try/catch",
        async_await::unawaited_rejection,
    ),
    Scenario::new(
        "await-keeps-promise",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "awaiting a promise does not turn the binding into its value",
        async_await::await_keeps_promise,
    ),
    Scenario::new(
        "await-assigns-value",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "the awaited value lives in the assignment, not the promise",
        async_await::await_assigns_value,
    ),
    Scenario::new(
        "staggered-routines",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "three routines started together resume in delay order",
        async_await::staggered_routines,
    ),
    Scenario::new(
        "await-zero-delay",
        Chapter::AsyncAwait,
        "asyncAwaitPlayground",
        "await and a zero-delay timer: the await always wins",
        async_await::await_zero_delay,
    ),
];

/// Every scenario, in presentation order.
pub fn catalog() -> &'static [Scenario] {
    &CATALOG
}

/// Looks a scenario up by name.
pub fn find(name: &str) -> Option<&'static Scenario> {
    CATALOG.iter().find(|s| s.name == name)
}

/// Scenarios of one chapter, in presentation order.
pub fn by_chapter(chapter: Chapter) -> impl Iterator<Item = &'static Scenario> {
    CATALOG.iter().filter(move |s| s.chapter == chapter)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

//! Async runtime for the promise lab.
//!
//! This crate provides an explicit, single-threaded event loop and the promise
//! type that runs on it:
//! - [`EventLoop`] - microtask and timer tiers, virtual clock, call stack and
//!   unhandled-rejection reporting
//! - [`Promise`] - one-shot deferred result with `then`/`catch` reactions and
//!   `.await` support for routines started with [`EventLoop::spawn`]
//! - [`Console`] - the recorded trace every scenario prints to
//!
//! # Examples
//!
//! ## Event Loop Usage
//!
//! ```
//! use async_runtime::EventLoop;
//!
//! let event_loop = EventLoop::new();
//! let el = event_loop.clone();
//! event_loop.queue_microtask(move || {
//!     el.log("later");
//!     Ok(())
//! });
//! event_loop.log("now");
//! event_loop.run_until_done().unwrap();
//! assert_eq!(event_loop.stdout(), vec!["now", "later"]);
//! ```
//!
//! ## Async routines
//!
//! ```
//! use async_runtime::{EventLoop, Promise};
//! use core_types::Value;
//!
//! let event_loop = EventLoop::new();
//! let el = event_loop.clone();
//! let result = event_loop.spawn(async move {
//!     el.log("before await");
//!     let v = Promise::resolved(&el, Value::Smi(1)).await?;
//!     el.log(format!("after await: {}", v));
//!     Ok(v)
//! });
//! event_loop.log("caller continues");
//! event_loop.run_until_done().unwrap();
//! assert_eq!(
//!     event_loop.stdout(),
//!     vec!["before await", "caller continues", "after await: 1"]
//! );
//! assert!(!result.is_pending());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod clock;
pub mod console;
pub mod error;
pub mod event_loop;
pub mod promise;
pub mod task_queue;

// Re-export main types at crate root
pub use clock::VirtualClock;
pub use console::{Console, ConsoleWriter, Stream, TraceLine};
pub use error::RuntimeError;
pub use event_loop::{EventLoop, WeakEventLoop};
pub use promise::{Awaited, OnFulfilled, OnRejected, Promise, PromiseReaction, PromiseState, Resolvers};
pub use task_queue::{MicroTask, MicrotaskQueue, Timer, TimerId, TimerQueue};

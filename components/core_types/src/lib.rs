//! Core JavaScript value types and error handling.
//!
//! This crate provides the foundational types shared by the event loop and
//! the scenario library: value representation, the thrown error type, and
//! call stack frames.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`JsError`] - JavaScript errors with stack traces
//! - [`ErrorKind`] - Types of JavaScript errors
//! - [`StackFrame`] - Call stack frame information
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, Value};
//!
//! let num = Value::Smi(42);
//! assert_eq!(num.to_string(), "42");
//!
//! let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
//! assert_eq!(error.kind, ErrorKind::TypeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;
mod value;

pub use error::{ErrorKind, JsError};
pub use source::StackFrame;
pub use value::Value;

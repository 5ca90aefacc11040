//! JavaScript error types and error handling.
//!
//! This module provides the thrown-value type used by every scenario: an
//! error kind matching JavaScript's built-in constructors, a message, and the
//! call stack captured where the error was created.

use crate::{StackFrame, Value};
use std::fmt;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Plain `new Error()`
    Error,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undefined variable
    ReferenceError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
        };
        f.write_str(name)
    }
}

/// A JavaScript error with message and stack trace.
///
/// This is the value a scenario "throws": it travels through `Result::Err`
/// on the synchronous path and becomes a promise's rejection reason on the
/// deferred path.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError};
///
/// let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
/// assert_eq!(error.to_string(), "TypeError: undefined is not a function");
/// assert_eq!(JsError::error("").to_string(), "Error");
/// assert_eq!(JsError::thrown(core_types::Value::Undefined).to_string(), "undefined");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", headline(.kind, .message, .thrown))]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Call stack at the time the error was created, innermost frame first
    pub stack: Vec<StackFrame>,
    /// Set when a plain value was thrown instead of an error object
    pub thrown: Option<Value>,
}

fn headline(kind: &ErrorKind, message: &str, thrown: &Option<Value>) -> String {
    match thrown {
        Some(value) => value.to_string(),
        None if message.is_empty() => kind.to_string(),
        None => format!("{}: {}", kind, message),
    }
}

impl JsError {
    /// Creates an error with an empty stack.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
            thrown: None,
        }
    }

    /// A non-error value used as a throw or rejection reason, such as the
    /// `undefined` behind a bare `reject()`.
    ///
    /// Such a value carries no stack, so it prints as the value alone.
    pub fn thrown(value: Value) -> Self {
        Self {
            thrown: Some(value),
            ..Self::new(ErrorKind::Error, "")
        }
    }

    /// Shorthand for `new Error(message)`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Error, message)
    }

    /// Shorthand for a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Attaches a captured call stack.
    pub fn with_stack(mut self, stack: Vec<StackFrame>) -> Self {
        if self.thrown.is_none() {
            self.stack = stack;
        }
        self
    }

    /// Renders the error the way `error.stack` reads in V8.
    ///
    /// ```
    /// use core_types::{JsError, StackFrame};
    ///
    /// let err = JsError::error("boom").with_stack(vec![StackFrame::named("funcC")]);
    /// assert_eq!(err.stack_trace(), "Error: boom\n    at funcC");
    /// ```
    pub fn stack_trace(&self) -> String {
        let mut out = self.to_string();
        for frame in &self.stack {
            out.push_str("\n    at ");
            out.push_str(&frame.to_string());
        }
        out
    }
}

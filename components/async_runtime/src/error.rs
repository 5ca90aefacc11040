//! Runtime-level errors.

use core_types::JsError;
use thiserror::Error;

/// Failures that end a run of the event loop.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// A timer callback or microtask returned an error nothing caught.
    #[error("Uncaught {0}")]
    Uncaught(JsError),
}

impl RuntimeError {
    /// The JavaScript error behind this failure.
    pub fn js_error(&self) -> &JsError {
        match self {
            RuntimeError::Uncaught(error) => error,
        }
    }
}

//! Error types for the CLI

use async_runtime::RuntimeError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// No scenario has this name
    #[error("unknown scenario '{0}' (try --list)")]
    UnknownScenario(String),

    /// No chapter has this name
    #[error("unknown chapter '{0}' (expected one of: {1})")]
    UnknownChapter(String, String),

    /// A scenario ended with an uncaught exception
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Writing the trace failed
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a trace line failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit status for this error.
    ///
    /// Usage errors exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::UnknownScenario(_) | CliError::UnknownChapter(..) => 2,
            CliError::Runtime(_) | CliError::Io(_) | CliError::Json(_) => 1,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

//! Promise lab CLI library
//!
//! Argument parsing, scenario selection and trace printing for the
//! `promise-lab` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod runner;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use runner::{run, RunSummary, Runner};

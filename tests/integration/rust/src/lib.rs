//! Integration test suite for the promise lab
//!
//! This crate provides integration tests that verify the runtime, the
//! scenario library and the CLI work together across component boundaries.

/// Re-export components for test convenience
pub mod components {
    pub use async_runtime;
    pub use core_types;
    pub use lab_cli;
    pub use scenarios;
}

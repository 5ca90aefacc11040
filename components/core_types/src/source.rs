//! Stack frame type for JavaScript error tracking.

use std::fmt;

/// Represents a single frame in a JavaScript call stack.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame::named("funcA").in_source("03-eventLoop.js");
/// assert_eq!(frame.to_string(), "funcA (03-eventLoop.js)");
/// assert_eq!(StackFrame::anonymous().to_string(), "<anonymous>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function, or None for anonymous functions
    pub function_name: Option<String>,
    /// URL or file path of the source, or None if not available
    pub source_url: Option<String>,
}

impl StackFrame {
    /// A frame for a named function.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            function_name: Some(name.into()),
            source_url: None,
        }
    }

    /// A frame for an anonymous function.
    pub fn anonymous() -> Self {
        Self {
            function_name: None,
            source_url: None,
        }
    }

    /// Sets the source the frame belongs to.
    pub fn in_source(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function_name.as_deref().unwrap_or("<anonymous>");
        match &self.source_url {
            Some(url) => write!(f, "{} ({})", name, url),
            None => f.write_str(name),
        }
    }
}

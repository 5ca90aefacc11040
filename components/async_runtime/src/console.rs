//! Console trace.
//!
//! Everything a scenario prints goes through [`Console`], which records each
//! line together with the stream it was written to and the virtual time it was
//! written at. The recorded trace is the artifact tests assert against; an
//! optional [`ConsoleWriter`] mirrors lines live.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Which output stream a line was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// `console.log` output
    Stdout,
    /// Diagnostics: uncaught exceptions and rejection warnings
    Stderr,
}

/// One line of trace output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLine {
    /// Stream the line was written to
    pub stream: Stream,
    /// The text, without trailing newline
    pub text: String,
    /// Virtual time in milliseconds when the line was written
    pub at_ms: u64,
}

/// Console output writer trait
pub trait ConsoleWriter {
    /// Write one line as it is produced
    fn write(&self, line: &TraceLine);
}

/// Recording console.
#[derive(Default)]
pub struct Console {
    lines: RefCell<Vec<TraceLine>>,
    writer: Option<Box<dyn ConsoleWriter>>,
}

impl Console {
    /// A console that only records.
    pub fn new() -> Self {
        Self::default()
    }

    /// A console that records and mirrors every line to `writer`.
    pub fn with_writer(writer: Box<dyn ConsoleWriter>) -> Self {
        Self {
            lines: RefCell::new(Vec::new()),
            writer: Some(writer),
        }
    }

    /// Appends a line.
    pub fn write(&self, stream: Stream, text: String, at_ms: u64) {
        let line = TraceLine {
            stream,
            text,
            at_ms,
        };
        if let Some(writer) = &self.writer {
            writer.write(&line);
        }
        self.lines.borrow_mut().push(line);
    }

    /// Snapshot of every line written so far.
    pub fn lines(&self) -> Vec<TraceLine> {
        self.lines.borrow().clone()
    }

    /// Text of the lines written to one stream, in order.
    pub fn texts(&self, stream: Stream) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|l| l.stream == stream)
            .map(|l| l.text.clone())
            .collect()
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("lines", &self.lines.borrow().len())
            .finish_non_exhaustive()
    }
}

//! Output sinks for tool logs.
//!
//! The manager writes headers, streamed process output and result lines to
//! an [`OutputSink`]. Writes are append-only and never fail from the
//! caller's point of view.

use std::io::Write;
use std::sync::Mutex;

/// Destination for tool output.
pub trait OutputSink: Send + Sync {
    /// Append one line.
    fn append_line(&self, line: &str);
}

/// Writes lines to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn append_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", line);
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<String>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// All lines joined with newlines.
    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }
}

impl OutputSink for CaptureSink {
    fn append_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

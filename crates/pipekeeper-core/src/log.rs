//! Captured service output entries.
//!
//! Every non-empty line the supervised process writes is recorded as an
//! immutable [`LogEntry`] tagged with the stream it came from. Entries live
//! in a bounded ring owned by the runtime's log recorder and are only ever
//! evicted from the front.

use serde::{Deserialize, Serialize};

/// Origin of a captured log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    /// Line read from the service's standard output.
    Stdout,
    /// Line read from the service's standard error.
    Stderr,
    /// Entry produced by the supervisor itself (exit reporting).
    System,
}

impl LogSource {
    /// Display prefix used when rendering buffered lines.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Stdout => "[STDOUT] ",
            Self::Stderr => "[STDERR] ",
            Self::System => "[SYSTEM] ",
        }
    }
}

/// A single captured output line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unix timestamp in milliseconds when the line was captured.
    pub timestamp: u64,
    /// Stream the line originated from.
    pub source: LogSource,
    /// The line content, without trailing newline.
    pub message: String,
}

impl LogEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(source: LogSource, message: impl Into<String>) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        Self {
            timestamp,
            source,
            message: message.into(),
        }
    }

    /// Render the entry the way it is shown in a viewer.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}{}", self.source.prefix(), self.message)
    }
}

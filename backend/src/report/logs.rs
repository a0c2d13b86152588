//! Structured run log.
//!
//! Every decision a pipeline run takes (columns dropped, offers matched,
//! filler rows added) is recorded as a [`LogEntry`] in the run's own
//! [`RunLog`], which is returned with the result. Callers decide how to
//! render it: the CLI prints it to stderr, the JSON report embeds it.

use serde::{Deserialize, Serialize};

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// One display line: indentation, level marker, message.
    pub fn render(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(self.indent as usize);
        format!("{}{} {}", indent, prefix, self.message)
    }
}

/// Ordered log of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.push(LogEntry::info(msg));
    }

    pub fn success(&mut self, msg: impl Into<String>) {
        self.push(LogEntry::success(msg));
    }

    pub fn warning(&mut self, msg: impl Into<String>) {
        self.push(LogEntry::warning(msg));
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.push(LogEntry::error(msg));
    }

    pub fn info_indent(&mut self, msg: impl Into<String>, indent: u8) {
        self.push(LogEntry::info(msg).with_indent(indent));
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append all entries of another log.
    pub fn extend(&mut self, other: RunLog) {
        self.entries.extend(other.entries);
    }

    /// Number of entries at `level`.
    pub fn count(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }

    /// Whole log, one rendered entry per line.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

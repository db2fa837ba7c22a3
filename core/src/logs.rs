//! Dashboard log stream.
//!
//! The pipeline reports progress and "nothing to draw" conditions here. Every
//! entry is printed to stderr (stdout carries the chart JSON) and fanned out
//! to any open [`NoticeCollector`], which is how the CLI attaches warnings to
//! the view it prints.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Entries a collector can fall behind by before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 256;

/// Severity of a log entry; warnings and errors count as notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn marker(&self) -> &'static str {
        match self {
            LogLevel::Info => "",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠️  ",
            LogLevel::Error => "❌ ",
        }
    }

    pub fn is_notice(&self) -> bool {
        *self >= LogLevel::Warning
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth under the previous entry.
    pub indent: u8,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "   ".repeat(self.indent as usize + 1);
        write!(f, "{}{}{}", indent, self.level.marker(), self.message)
    }
}

/// Process-wide log the pipeline writes to.
pub static DASHBOARD_LOG: Lazy<DashboardLog> = Lazy::new(DashboardLog::new);

/// Prints entries and hands them to every open collector.
pub struct DashboardLog {
    sender: broadcast::Sender<LogEntry>,
}

impl DashboardLog {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, entry: LogEntry) {
        eprintln!("{}", entry);
        // Nobody collecting is the normal case
        let _ = self.sender.send(entry);
    }

    /// Start collecting the notices emitted from now on.
    pub fn collector(&self) -> NoticeCollector {
        NoticeCollector {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for DashboardLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Gathers warning and error messages for a caller that wants them in its output.
pub struct NoticeCollector {
    receiver: broadcast::Receiver<LogEntry>,
}

impl NoticeCollector {
    /// Notice messages received since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        let mut notices = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(entry) if entry.level.is_notice() => notices.push(entry.message),
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        notices
    }
}

pub fn log_info(msg: impl Into<String>) {
    DASHBOARD_LOG.emit(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    DASHBOARD_LOG.emit(LogEntry::new(LogLevel::Info, msg).with_indent(indent));
}

pub fn log_success(msg: impl Into<String>) {
    DASHBOARD_LOG.emit(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    DASHBOARD_LOG.emit(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    DASHBOARD_LOG.emit(LogEntry::new(LogLevel::Error, msg));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_keeps_only_notices() {
        let log = DashboardLog::new();
        let mut collector = log.collector();

        log.emit(LogEntry::new(LogLevel::Info, "Rendering dashboard over 3 records"));
        log.emit(LogEntry::new(LogLevel::Warning, "1 heatmap cell(s) have no values").with_indent(1));
        log.emit(LogEntry::new(LogLevel::Success, "Heatmap: 3 groups × 4 fields"));
        log.emit(LogEntry::new(LogLevel::Error, "Missing column: diet"));

        assert_eq!(
            collector.drain(),
            vec!["1 heatmap cell(s) have no values", "Missing column: diet"]
        );
        assert!(collector.drain().is_empty());
    }

    #[test]
    fn test_collector_sees_only_later_entries() {
        let log = DashboardLog::new();
        log.emit(LogEntry::new(LogLevel::Warning, "before"));

        let mut collector = log.collector();
        log.emit(LogEntry::new(LogLevel::Warning, "after"));
        assert_eq!(collector.drain(), vec!["after"]);
    }

    #[test]
    fn test_emit_without_collectors_does_not_panic() {
        DashboardLog::default().emit(LogEntry::new(LogLevel::Info, "nobody listening"));
    }

    #[test]
    fn test_display_indents_and_marks() {
        let entry = LogEntry::new(LogLevel::Success, "done").with_indent(1);
        assert_eq!(entry.to_string(), "      ✓ done");
        assert_eq!(LogEntry::new(LogLevel::Info, "x").to_string(), "   x");
    }

    #[test]
    fn test_entry_serializes_lowercase_level() {
        let json = serde_json::to_value(LogEntry::new(LogLevel::Warning, "w")).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["indent"], 0);
    }
}

//! Diagnostics sink for recoverable failures.
//!
//! Components that can fail softly (import, texture decode) report through a
//! [`DiagnosticsSink`] passed in by the caller instead of global state. The
//! [`LogBuffer`] keeps every entry for the log panel and forwards it to the
//! `log` facade.

use std::fmt;

use parking_lot::Mutex;

/// Severity tag attached to every diagnostic line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }

    fn level(&self) -> log::Level {
        match self {
            Severity::Info => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

/// One recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    /// `"[INFO] message"`
    pub fn as_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity.tag(), self.message)
    }
}

/// Append-only destination for diagnostics.
pub trait DiagnosticsSink {
    fn record(&self, severity: Severity, message: &str);
}

/// In-memory sink shared between the frame loop and the UI.
#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: Mutex<Vec<LogEntry>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of all entries recorded so far
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Entries recorded after the first `from` entries
    pub fn entries_since(&self, from: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        entries.get(from..).map(<[LogEntry]>::to_vec).unwrap_or_default()
    }
}

impl DiagnosticsSink for LogBuffer {
    fn record(&self, severity: Severity, message: &str) {
        log::log!(severity.level(), "{}", message);
        self.entries.lock().push(LogEntry {
            severity,
            message: message.to_string(),
        });
    }
}

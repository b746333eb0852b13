//! Staging Reporter
//!
//! The logging capability handed to every staging component. Components
//! never log through a global; they report to whatever [`Reporter`] they
//! were constructed with.
//!
//! - [`LogReporter`] forwards to the `log` facade (installed by the binary)
//! - [`RecordingReporter`] keeps an in-memory trail for tests and audits

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Log target used by [`LogReporter`].
pub const LOG_TARGET: &str = "cwlstage";

/// Severity of a reported event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    /// Post-processing of the execution cannot continue
    Fatal,
}

impl Severity {
    /// Maps onto the closest `log` level. `log` has no fatal level.
    pub fn log_level(self) -> log::Level {
        match self {
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warn => log::Level::Warn,
            Self::Error | Self::Fatal => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        };
        f.write_str(label)
    }
}

/// Sink for events emitted by the staging components.
pub trait Reporter: Send + Sync {
    /// Reports one event raised while performing `operation`.
    fn report(&self, severity: Severity, operation: &str, message: &str);
}

/// Forwards every event to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl LogReporter {
    /// Returns a shareable handle, the usual way components receive it.
    pub fn shared() -> Arc<dyn Reporter> {
        Arc::new(Self)
    }
}

impl Reporter for LogReporter {
    fn report(&self, severity: Severity, operation: &str, message: &str) {
        if severity == Severity::Fatal {
            log::log!(target: LOG_TARGET, severity.log_level(), "FATAL [{}] {}", operation, message);
        } else {
            log::log!(target: LOG_TARGET, severity.log_level(), "[{}] {}", operation, message);
        }
    }
}

/// A single recorded event.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub severity: Severity,
    pub operation: String,
    pub message: String,
    /// When the event was reported
    pub timestamp: Instant,
}

/// Keeps every reported event in memory, in arrival order.
#[derive(Debug)]
pub struct RecordingReporter {
    entries: Mutex<Vec<ReportEntry>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all recorded events.
    pub fn entries(&self) -> Vec<ReportEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the events reported at exactly `severity`.
    pub fn with_severity(&self, severity: Severity) -> Vec<ReportEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.severity == severity)
            .collect()
    }

    /// Returns true if any event at `severity` mentions `needle`.
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.with_severity(severity)
            .iter()
            .any(|e| e.message.contains(needle))
    }
}

impl Default for RecordingReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, severity: Severity, operation: &str, message: &str) {
        let entry = ReportEntry {
            severity,
            operation: operation.to_string(),
            message: message.to_string(),
            timestamp: Instant::now(),
        };
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_keeps_order() {
        let reporter = RecordingReporter::new();
        reporter.report(Severity::Info, "bindings", "first");
        reporter.report(Severity::Fatal, "archive", "second");

        let entries = reporter.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].operation, "archive");
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[test]
    fn test_with_severity_filters() {
        let reporter = RecordingReporter::new();
        reporter.report(Severity::Debug, "outputs", "noise");
        reporter.report(Severity::Fatal, "outputs", "broken results");

        assert_eq!(reporter.with_severity(Severity::Fatal).len(), 1);
        assert!(reporter.contains(Severity::Fatal, "broken"));
        assert!(!reporter.contains(Severity::Debug, "broken"));
    }

    #[test]
    fn test_severity_log_level_mapping() {
        assert_eq!(Severity::Fatal.log_level(), log::Level::Error);
        assert_eq!(Severity::Warn.log_level(), log::Level::Warn);
        assert_eq!(Severity::Debug.log_level(), log::Level::Debug);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Fatal > Severity::Error);
        assert!(Severity::Debug < Severity::Info);
        assert_eq!(Severity::Fatal.to_string(), "FATAL");
    }

    #[test]
    fn test_log_reporter_without_logger_is_silent() {
        // No logger installed: the facade drops events
        let reporter = LogReporter::shared();
        reporter.report(Severity::Fatal, "archive", "nothing installed");
    }

    #[test]
    fn test_recording_reporter_default_is_empty() {
        let reporter = RecordingReporter::default();
        assert!(reporter.entries().is_empty());
    }
}

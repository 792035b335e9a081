//! Notification sink for user-visible failures
//!
//! Host adapters route these into their native notification surface; the
//! core never talks to a UI toolkit directly.

use std::sync::Mutex;

use tracing::{error, warn};

/// How severe a report is for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Activation is blocked
    Error,
    /// Activation proceeds in a degraded mode
    Warning,
}

/// A single user-visible report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

/// Replaceable sink for user-visible failure reports
pub trait Reporter: Send + Sync {
    fn report(&self, severity: Severity, title: &str, message: &str);
}

/// Reporter that forwards to the tracing subscriber at a matching level
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, severity: Severity, title: &str, message: &str) {
        match severity {
            Severity::Error => error!(title = title, "{}", message),
            Severity::Warning => warn!(title = title, "{}", message),
        }
    }
}

/// Reporter that records reports in memory, for tests and for host adapters
/// that drain reports on their own schedule
#[derive(Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<Report>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn entries(&self) -> Vec<Report> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Drain and return all reports
    pub fn take(&self) -> Vec<Report> {
        self.entries
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, severity: Severity, title: &str, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Report {
                severity,
                title: title.to_string(),
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_records() {
        let reporter = MemoryReporter::new();
        reporter.report(Severity::Error, "Interpreter missing", "no python found");
        reporter.report(Severity::Warning, "Site-packages missing", "degraded");

        let entries = reporter.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, Severity::Error);
        assert_eq!(entries[1].severity, Severity::Warning);
    }

    #[test]
    fn test_memory_reporter_take_drains() {
        let reporter = MemoryReporter::new();
        reporter.report(Severity::Warning, "a", "b");

        assert_eq!(reporter.take().len(), 1);
        assert!(reporter.entries().is_empty());
    }
}

//! Email processing log.
//!
//! A run of the backend's mailbox scraper is reported step by step; the
//! entries are kept so the caller can show them after the run.

use chrono::{DateTime, Local};
use std::fmt;

use crate::notify::NotificationLevel;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: NotificationLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<7} {}",
            self.timestamp.format("%H:%M:%S"),
            self.level.to_string().to_uppercase(),
            self.message
        )
    }
}

/// Entries of one processing run, oldest first
#[derive(Debug, Clone, Default)]
pub struct ProcessLog {
    entries: Vec<LogEntry>,
}

impl ProcessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.entries.push(LogEntry {
            timestamp: Local::now(),
            level,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.level == NotificationLevel::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entries() {
        let mut log = ProcessLog::new();
        log.push(NotificationLevel::Info, "Starting email processing");
        assert!(!log.has_errors());

        log.push(NotificationLevel::Error, "Processing failed");
        assert!(log.has_errors());
        assert_eq!(log.entries().len(), 2);

        let line = log.entries()[1].to_string();
        assert!(line.contains("ERROR"));
        assert!(line.ends_with("Processing failed"));
    }
}

//! Action log - append-only record of hook outcomes

pub mod store;

pub use store::FileActionLog;

use crate::core::{RunStatus, RunSummary};
use chrono::{DateTime, Local};
use std::fmt;
use std::sync::Mutex;

/// Severity of an action log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => f.write_str("INFO"),
            LogLevel::Warning => f.write_str("WARNING"),
            LogLevel::Error => f.write_str("ERROR"),
        }
    }
}

/// One line of the action log: `<timestamp> <level> <message>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl ActionLogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }

    /// Entry recording the outcome of a hook run
    pub fn from_summary(summary: &RunSummary) -> Self {
        let level = match summary.status {
            RunStatus::Succeeded => LogLevel::Info,
            RunStatus::Failed => LogLevel::Error,
        };
        Self {
            timestamp: summary.finished_at.with_timezone(&Local),
            level,
            message: summary.log_message(),
        }
    }
}

impl fmt::Display for ActionLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Entries are single lines
        let message = self.message.replace('\n', " ");
        write!(
            f,
            "{} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.level,
            message
        )
    }
}

/// Trait for action log backends
pub trait ActionLog: Send + Sync {
    /// Append an entry
    fn append(&self, entry: &ActionLogEntry) -> std::io::Result<()>;

    /// The last `count` lines, oldest first
    fn tail(&self, count: usize) -> std::io::Result<Vec<String>>;
}

/// In-memory action log (for testing)
#[derive(Debug, Default)]
pub struct InMemoryActionLog {
    lines: Mutex<Vec<String>>,
}

impl InMemoryActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl ActionLog for InMemoryActionLog {
    fn append(&self, entry: &ActionLogEntry) -> std::io::Result<()> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| std::io::Error::other("action log lock poisoned"))?;
        lines.push(entry.to_string());
        Ok(())
    }

    fn tail(&self, count: usize) -> std::io::Result<Vec<String>> {
        let lines = self.lines();
        let start = lines.len().saturating_sub(count);
        Ok(lines[start..].to_vec())
    }
}

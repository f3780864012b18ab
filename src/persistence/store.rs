//! File-backed action log

use crate::core::Repository;
use crate::persistence::{ActionLog, ActionLogEntry};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Action log stored as a text file, one entry per line
///
/// Only ever appended to; never rotated or truncated.
#[derive(Debug, Clone)]
pub struct FileActionLog {
    path: PathBuf,
}

impl FileActionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log inside the repository's `cricic/` directory
    pub fn for_repository(repository: &Repository) -> Self {
        Self::new(repository.action_log())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl ActionLog for FileActionLog {
    fn append(&self, entry: &ActionLogEntry) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", entry)
    }

    fn tail(&self, count: usize) -> std::io::Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(count);
        Ok(lines[start..].iter().map(|l| l.to_string()).collect())
    }
}

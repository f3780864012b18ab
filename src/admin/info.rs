//! Repository reporting

use crate::core::Repository;
use crate::persistence::{ActionLog, FileActionLog};
use anyhow::{bail, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::process::Command;

/// Number of action log lines shown by `info`
pub const LOG_TAIL: usize = 5;

/// Most recent commit of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub age: String,
}

/// What `info` reports about a repository
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub path: PathBuf,
    /// `None` when there are no commits yet
    pub last_commit: Option<CommitInfo>,
    /// `None` when the action log does not exist
    pub recent_log: Option<Vec<String>>,
}

/// Collect the report for `repository`
pub fn info(repository: &Repository) -> Result<RepositoryInfo> {
    if !is_git_repo(repository) {
        bail!("{} is not a git repository", repository.root().display());
    }

    let log = FileActionLog::for_repository(repository);
    let recent_log = if log.exists() {
        Some(log.tail(LOG_TAIL)?)
    } else {
        None
    };

    Ok(RepositoryInfo {
        name: repository.name(),
        path: repository.root().to_path_buf(),
        last_commit: last_commit(repository),
        recent_log,
    })
}

fn is_git_repo(repository: &Repository) -> bool {
    if !repository.root().is_dir() {
        return false;
    }
    Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .current_dir(repository.root())
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn last_commit(repository: &Repository) -> Option<CommitInfo> {
    let output = Command::new("git")
        .args(["log", "--all", "--pretty=format:%h%x00%s%x00%cr", "-n", "1"])
        .current_dir(repository.root())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_commit_line(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `<hash>\0<subject>\0<relative date>`
fn parse_commit_line(line: &str) -> Option<CommitInfo> {
    let mut parts = line.trim_end().splitn(3, '\0');
    let hash = parts.next().filter(|h| !h.is_empty())?;
    let message = parts.next()?;
    let age = parts.next()?;
    Some(CommitInfo {
        hash: hash.to_string(),
        message: message.to_string(),
        age: age.to_string(),
    })
}

//! Run state models

use crate::core::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which server-side hook started the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookKind {
    /// Before objects are accepted; exit status decides the push
    PreReceive,
    /// After the push; exit status is advisory
    PostReceive,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::PreReceive => f.write_str("pre-receive"),
            HookKind::PostReceive => f.write_str("post-receive"),
        }
    }
}

/// Outcome of a single target invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    pub target: String,
    /// `None` when the tool could not be run or was killed by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Outcome of running one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub dry_run: bool,
    /// Invoked targets in order; a failing target is always the last entry
    pub results: Vec<TargetResult>,
}

impl StageReport {
    pub fn new(stage: Stage, dry_run: bool) -> Self {
        Self {
            stage,
            dry_run,
            results: Vec::new(),
        }
    }

    /// True when every invoked target succeeded (vacuously for none)
    pub fn succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    /// Target that stopped the stage, if any
    pub fn failed_target(&self) -> Option<&str> {
        self.results
            .iter()
            .find(|r| !r.success)
            .map(|r| r.target.as_str())
    }

    /// Names of the invoked targets, in order
    pub fn invoked(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.target.as_str()).collect()
    }
}

/// What happened to a staged buildfile during a deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildfileUpdate {
    /// No `.cricicbuild` in the work tree
    NotStaged,
    /// Staged buildfile passed the dry run and is now live
    Adopted,
}

/// Final status of a hook run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

/// Summary of a finished hook run, written to the action log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub hook: HookKind,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub message: String,
}

impl RunSummary {
    /// Message as recorded in the action log
    pub fn log_message(&self) -> String {
        let id = self.run_id.to_string();
        format!("[{}] {} ({}): {}", self.hook, status_word(self.status), &id[..8], self.message)
    }
}

fn status_word(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Succeeded => "OK",
        RunStatus::Failed => "FAILED",
    }
}

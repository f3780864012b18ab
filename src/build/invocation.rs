//! Build tool invocation and output types

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that prevent the build tool from producing an exit status
#[derive(Debug, Error)]
pub enum BuildToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timeout after {0} seconds")]
    Timeout(u64),
}

/// A single target run: `<tool> -f <buildfile> <target> [-s] [-n]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub buildfile: PathBuf,
    pub target: String,
    pub silent: bool,
    pub dry_run: bool,
    pub working_dir: PathBuf,
    /// Overrides the tool's own timeout when set
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Command-line arguments passed to the tool
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-f".into(),
            self.buildfile.clone().into_os_string(),
            self.target.clone().into(),
        ];
        if self.silent {
            args.push("-s".into());
        }
        if self.dry_run {
            args.push("-n".into());
        }
        args
    }
}

/// Exit status and captured streams of a finished invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl BuildOutput {
    /// Output of a run that exited with `code`
    pub fn exited(code: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

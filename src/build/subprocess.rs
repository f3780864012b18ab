//! Build tool subprocess - runs `make` with captured output

use crate::build::{BuildOutput, BuildToolError, Invocation};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs the build tool as a child process
#[derive(Debug, Clone)]
pub struct BuildSubprocess {
    program: String,
    timeout: Option<Duration>,
}

impl BuildSubprocess {
    pub fn new(program: String, timeout: Option<Duration>) -> Self {
        Self { program, timeout }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run one invocation and wait for it to exit
    ///
    /// A non-zero exit is not an error here; it comes back in
    /// [`BuildOutput::exit_code`].
    ///
    /// # Errors
    /// Returns `BuildToolError` if the program cannot be spawned or the
    /// configured timeout elapses (the child is killed).
    pub async fn run(&self, invocation: &Invocation) -> Result<BuildOutput, BuildToolError> {
        debug!(
            "Running {} {:?} in {}",
            self.program,
            invocation.args(),
            invocation.working_dir.display()
        );

        let mut command = Command::new(&self.program);
        command
            .args(invocation.args())
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match invocation.timeout.or(self.timeout) {
            Some(limit) => timeout(limit, command.output())
                .await
                .map_err(|_| BuildToolError::Timeout(limit.as_secs()))?,
            None => command.output().await,
        }
        .map_err(|source| BuildToolError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let exit_code = output.status.code();
        if !output.status.success() {
            warn!(
                "{} {} exited with {:?}",
                self.program, invocation.target, exit_code
            );
        }

        Ok(BuildOutput {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

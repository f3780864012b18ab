//! External build tool
//!
//! The target runner only talks to the [`BuildTool`] trait, so tests can
//! swap in a scripted fake instead of spawning `make`.

pub mod client;
pub mod invocation;
pub mod subprocess;

use async_trait::async_trait;
pub use client::{target_timeout, BuildToolConfig};
pub use invocation::{BuildOutput, BuildToolError, Invocation};
pub use subprocess::BuildSubprocess;

/// Trait for running build targets - allows for different implementations
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Run a single target and capture its output
    async fn run(&self, invocation: &Invocation) -> Result<BuildOutput, BuildToolError>;
}

/// `make` (or a compatible tool) run as a subprocess
#[derive(Debug, Clone)]
pub struct MakeTool {
    subprocess: BuildSubprocess,
}

impl MakeTool {
    /// Create a new make tool
    ///
    /// `config.program` is the executable to run, `config.timeout` bounds
    /// every target that does not carry its own timeout.
    pub fn new(config: BuildToolConfig) -> Self {
        Self {
            subprocess: BuildSubprocess::new(config.program, config.timeout),
        }
    }
}

#[async_trait]
impl BuildTool for MakeTool {
    async fn run(&self, invocation: &Invocation) -> Result<BuildOutput, BuildToolError> {
        self.subprocess.run(invocation).await
    }
}

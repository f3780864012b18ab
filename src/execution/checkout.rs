//! Materializing the pushed branch into the work directory

use crate::core::PipelineError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Trait for checking out a branch of a bare repository
#[async_trait]
pub trait Checkout: Send + Sync {
    /// Force-checkout `branch` of `repository` into `work_dir`
    async fn checkout(
        &self,
        repository: &Path,
        work_dir: &Path,
        branch: &str,
    ) -> Result<(), PipelineError>;
}

/// Checkout through the `git` executable
#[derive(Debug, Clone)]
pub struct GitCheckout {
    program: String,
}

impl Default for GitCheckout {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCheckout {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkout for GitCheckout {
    async fn checkout(
        &self,
        repository: &Path,
        work_dir: &Path,
        branch: &str,
    ) -> Result<(), PipelineError> {
        debug!(
            "Checking out {} from {} into {}",
            branch,
            repository.display(),
            work_dir.display()
        );

        let mut work_tree = std::ffi::OsString::from("--work-tree=");
        work_tree.push(work_dir);
        let mut git_dir = std::ffi::OsString::from("--git-dir=");
        git_dir.push(repository);

        let output = Command::new(&self.program)
            .arg(work_tree)
            .arg(git_dir)
            .args(["checkout", "-q", "-f", branch])
            .output()
            .await
            .map_err(|e| PipelineError::CheckoutFailure(format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::CheckoutFailure(format!(
                "git checkout {} exited with {:?}: {}",
                branch,
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

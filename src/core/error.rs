//! Pipeline error types

use crate::core::{ConfigError, Stage};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a hook run
///
/// Every variant carries a message meant for the person pushing; the
/// binary prints it and turns it into a non-zero exit status.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("not initialized: {0}")]
    NotInitialized(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("target '{target}' failed in stage {stage}")]
    TargetFailure { stage: Stage, target: String },

    #[error("buildfile update rejected: target '{target}' failed the dry run")]
    BuildDescriptionInvalid { target: String },

    #[error("checkout failed: {0}")]
    CheckoutFailure(String),

    #[error("repository is locked by another run: {0}")]
    Locked(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

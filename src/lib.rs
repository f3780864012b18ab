//! cricic - a tiny git-managed CI
//!
//! A push to a bare repository runs the `pre` targets of a makefile before
//! it is accepted, then checks the pushed branch out into a work directory
//! and runs the `post` targets there.

pub mod admin;
pub mod build;
pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use build::{BuildOutput, BuildTool, BuildToolConfig, BuildToolError, Invocation, MakeTool};
pub use crate::core::{ConfigResolver, ConfigSource, EffectiveConfig, PipelineError, Repository, Stage};
pub use execution::{Checkout, DeployReport, GitCheckout, HookEngine, HookEvent, TargetRunner};

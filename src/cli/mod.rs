//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{InfoCommand, InitCommand, RemoveCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// A tiny git-managed CI
#[derive(Debug, Parser, Clone)]
#[command(name = "cricic")]
#[command(version)]
#[command(about = "A tiny git-managed CI", long_about = None)]
#[command(after_help = "See the README for more help")]
pub struct Cli {
    /// Repository directory
    #[arg(default_value = ".")]
    pub repository: PathBuf,

    #[command(subcommand)]
    pub command: Command,

    /// Configuration file read after all other configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Initialise a new cricic repository
    Init(InitCommand),

    /// Show information about a repository
    Info(InfoCommand),

    /// Remove cricic files from a repository
    Remove(RemoveCommand),

    /// Run the pre-receive hook
    #[command(name = "pre-receive")]
    PreReceive,

    /// Run the post-receive hook
    #[command(name = "post-receive")]
    PostReceive,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

//! CLI command definitions

use clap::Args;

/// Create a bare repository wired to cricic
#[derive(Debug, Args, Clone)]
pub struct InitCommand {}

/// Show information about a repository
#[derive(Debug, Args, Clone)]
pub struct InfoCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Remove cricic hooks and configuration from a repository
#[derive(Debug, Args, Clone)]
pub struct RemoveCommand {
    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Parse a yes/no answer; anything but `y`/`yes` is a no
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

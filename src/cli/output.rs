//! CLI output formatting
//!
//! Hook output reaches the pusher's terminal through git (`remote: ...`),
//! so every line is plain text with optional styling.

use crate::core::{RunStatus, Stage};
use crate::execution::HookEvent;
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");

/// Prefix for relayed target stdout
pub const STDOUT_PAD: &str = "    ";

/// Prefix for relayed target stderr
pub const STDERR_PAD: &str = "!!  ";

/// Prefix every line of `raw` with `pad`
pub fn leftpad(raw: &str, pad: &str) -> String {
    raw.lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Banner printed before each target
pub fn target_banner(stage: Stage, target: &str, dry_run: bool) -> String {
    let banner = format!("\n-- Stage: {}, Target: {}", stage, target.to_uppercase());
    if dry_run {
        format!("{} {}", banner, style("(dry run)").dim())
    } else {
        banner
    }
}

/// Format a hook event for display, `None` for events that print nothing
pub fn format_hook_event(event: &HookEvent) -> Option<String> {
    match event {
        HookEvent::RunStarted { .. } => None,
        HookEvent::TargetStarted {
            stage,
            target,
            dry_run,
        } => Some(target_banner(*stage, target, *dry_run)),
        HookEvent::TargetOutput { stdout, .. } => {
            if stdout.is_empty() {
                None
            } else {
                Some(leftpad(stdout, STDOUT_PAD))
            }
        }
        HookEvent::TargetFailed {
            stage,
            target,
            exit_code,
            stderr,
        } => {
            let exit = match exit_code {
                Some(code) => format!("exit code {}", code),
                None => "no exit code".to_string(),
            };
            let banner = format!(
                "-- Error in stage {}, target {} ({})",
                stage,
                target.to_uppercase(),
                exit
            );
            let banner = style(banner).red().to_string();
            if stderr.is_empty() {
                Some(banner)
            } else {
                Some(format!("{}\n{}", style(leftpad(stderr, STDERR_PAD)).red(), banner))
            }
        }
        HookEvent::WorkDirCreated { path } => {
            Some(format!("{}Created work dir {}", STDERR_PAD, path.display()))
        }
        HookEvent::CheckedOut { branch, work_dir } => Some(format!(
            "{} Checked out {} into {}",
            INFO,
            style(branch).cyan(),
            style(work_dir.display()).dim()
        )),
        HookEvent::BuildfileUpdating { .. } => Some("Updating buildfile".to_string()),
        HookEvent::BuildfileAdopted { .. } => Some(format!("{} Buildfile updated", CHECK)),
        HookEvent::BuildfileRejected { target } => Some(
            style(format!(
                "{}Buildfile test failed on target {}, keeping the previous buildfile",
                STDERR_PAD,
                target.to_uppercase()
            ))
            .red()
            .to_string(),
        ),
        HookEvent::PushRejected => Some(format!("{}", style("-- Rejecting push").red())),
        HookEvent::DeployCancelled => {
            Some(format!("{}", style("-- Cancelling further steps").red()))
        }
        HookEvent::RunFinished { hook, status, .. } => match status {
            RunStatus::Succeeded => Some(format!(
                "\n{} {} {}",
                CHECK,
                style(hook).bold(),
                style("completed").green()
            )),
            RunStatus::Failed => Some(format!(
                "\n{} {} {}",
                CROSS,
                style(hook).bold(),
                style("failed").red()
            )),
        },
    }
}

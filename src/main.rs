use anyhow::{Context, Result};
use cricic::admin::{self, RepositoryInfo};
use cricic::build::{BuildToolConfig, MakeTool};
use cricic::cli::commands::{is_confirmation, InfoCommand, RemoveCommand};
use cricic::cli::output::{format_hook_event, style, CHECK, INFO};
use cricic::cli::{Cli, Command};
use cricic::core::{ConfigResolver, Repository};
use cricic::execution::{GitCheckout, HookEngine};
use cricic::persistence::FileActionLog;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Diagnostics go to stderr; stdout is relayed to the pusher
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let result = match &cli.command {
        Command::Init(_) => init_repository(&cli.repository),
        Command::Info(cmd) => show_info(&cli.repository, cmd),
        Command::Remove(cmd) => remove_repository(&cli.repository, cmd),
        Command::PreReceive => run_hook(&cli, Hook::Pre).await,
        Command::PostReceive => run_hook(&cli, Hook::Post).await,
    };

    if let Err(e) = result {
        println!("ERROR: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Pre,
    Post,
}

async fn run_hook(cli: &Cli, hook: Hook) -> Result<()> {
    let repository = Repository::new(absolute(&cli.repository));
    let resolver = ConfigResolver::with_default_locations();

    let tool = MakeTool::new(BuildToolConfig::default());
    let engine = HookEngine::new(tool, GitCheckout::new(), resolver)
        .with_override(cli.config.clone())
        .with_action_log(Arc::new(FileActionLog::for_repository(&repository)));

    engine.add_event_handler(|event| {
        if let Some(line) = format_hook_event(event) {
            // The pusher may hang up mid-run
            let _ = writeln!(std::io::stdout(), "{}", line);
        }
    });

    match hook {
        Hook::Pre => {
            engine.pre_receive(&repository).await?;
        }
        Hook::Post => {
            let report = engine.post_receive(&repository).await?;
            tracing::info!(
                "Deployed {} ({} post target(s))",
                report.branch,
                report.post.results.len()
            );
        }
    }
    Ok(())
}

fn init_repository(path: &Path) -> Result<()> {
    let hook_program = std::env::current_exe().context("Failed to locate the cricic binary")?;
    let report = admin::init(path, &ConfigResolver::with_default_locations(), &hook_program)?;

    println!(
        "{} Initialised an empty cricic repository in {}",
        CHECK,
        style(report.repository.display()).bold()
    );
    println!("To add repository:\n\t{}", report.remote_add_command());
    println!();
    println!("To push changes:\n\t{}", report.push_command());
    Ok(())
}

fn show_info(path: &Path, cmd: &InfoCommand) -> Result<()> {
    let report = admin::info(&Repository::new(absolute(path)))?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_info(&report);
    }
    Ok(())
}

fn print_info(report: &RepositoryInfo) {
    println!("# Repository: {}", style(&report.name).bold());

    match &report.last_commit {
        Some(commit) => {
            println!("## Current commit");
            println!("SHA1    : {}", style(&commit.hash).cyan());
            println!("Message : {}", commit.message);
            println!("Time    : {}", style(&commit.age).dim());
        }
        None => println!("\n## Could not load current commit"),
    }

    match &report.recent_log {
        Some(lines) => {
            println!("## Last {} log lines:", admin::info::LOG_TAIL);
            for line in lines {
                println!("{}", line);
            }
        }
        None => println!("## Action log ('./cricic/cricic.log') not present"),
    }
}

fn remove_repository(path: &Path, cmd: &RemoveCommand) -> Result<()> {
    if !cmd.yes && !confirm("Remove cricic files? [y/n] ")? {
        println!("{} Nothing removed", INFO);
        return Ok(());
    }

    admin::remove(&Repository::new(absolute(path)))?;
    println!("{} Removed cricic files from {}", CHECK, path.display());
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(is_confirmation(&answer))
}

fn absolute(path: &Path) -> PathBuf {
    match std::fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) => {
            debug!("Cannot resolve {}: {}", path.display(), e);
            path.to_path_buf()
        }
    }
}

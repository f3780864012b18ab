//! Creating and removing cricic repositories

use crate::core::{ConfigResolver, Repository, HOOKS};
use crate::persistence::{ActionLog, ActionLogEntry, FileActionLog, LogLevel};
use anyhow::{bail, Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Sample buildfile seeded into new repositories
pub const BUILDFILE_SAMPLE: &str = include_str!("../../conf/buildfile.sample");

/// Local config seeded into new repositories
pub const LOCAL_CONFIG_TEMPLATE: &str = "[repository]\nwork_dir = ./files\n";

/// What `init` created, and how to push to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub repository: PathBuf,
    pub remote_name: String,
    pub hostname: String,
    pub branch: String,
}

impl InitReport {
    /// `git remote add` line for the user's clone
    pub fn remote_add_command(&self) -> String {
        format!(
            "git remote add {} {}:{}",
            self.remote_name,
            self.hostname,
            self.repository.display()
        )
    }

    pub fn push_command(&self) -> String {
        format!("git push {} {}", self.remote_name, self.branch)
    }
}

/// Initialise a bare repository and wire its hooks to `hook_program`
///
/// The directory must not exist or be empty, and its parent must exist.
pub fn init(path: &Path, resolver: &ConfigResolver, hook_program: &Path) -> Result<InitReport> {
    if path.is_dir()
        && std::fs::read_dir(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .next()
            .is_some()
    {
        bail!("Directory exists and is not empty");
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.is_dir() {
        bail!("Cannot create directory");
    }

    let status = Command::new("git")
        .args(["init", "-q", "--bare"])
        .arg(path)
        .status()
        .context("Failed to run git")?;
    if !status.success() {
        bail!("git init failed with {:?}", status.code());
    }

    let root = std::fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let repository = Repository::new(&root);

    for hook in HOOKS {
        write_hook(&repository, hook, hook_program)?;
    }

    let config_dir = repository.config_dir();
    std::fs::create_dir(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    std::fs::write(repository.default_buildfile(), BUILDFILE_SAMPLE)
        .context("Failed to write buildfile")?;
    std::fs::write(repository.local_config(), LOCAL_CONFIG_TEMPLATE)
        .context("Failed to write local config")?;

    let config = resolver
        .resolve_global()
        .context("Failed to read global configuration")?;
    let report = InitReport {
        repository: root,
        remote_name: config.get("general", "remote_name")?.to_string(),
        hostname: config.get("general", "hostname")?.to_string(),
        branch: config.get("general", "branch")?.to_string(),
    };

    let log = FileActionLog::for_repository(&repository);
    if let Err(e) = log.append(&ActionLogEntry::new(LogLevel::Info, "Initialised repository")) {
        warn!("Failed to write action log: {}", e);
    }

    Ok(report)
}

/// Hook script running `<hook_program> <repository> <hook>`
pub fn hook_script(repository: &Repository, hook: &str, hook_program: &Path) -> String {
    format!(
        "#!/bin/sh\nexec {} {} {}\n",
        shell_quote(&hook_program.to_string_lossy()),
        shell_quote(&repository.root().to_string_lossy()),
        hook
    )
}

fn write_hook(repository: &Repository, hook: &str, hook_program: &Path) -> Result<()> {
    let path = repository.hook_path(hook);
    debug!("Writing hook {}", path.display());

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(hook_script(repository, hook, hook_program).as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o744))
            .with_context(|| format!("Failed to make {} executable", path.display()))?;
    }

    Ok(())
}

fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

/// Remove the hooks and the `cricic/` directory
///
/// The bare repository itself is left alone.
pub fn remove(repository: &Repository) -> Result<()> {
    for hook in HOOKS {
        let path = repository.hook_path(hook);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Removed hook {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
        }
    }

    let config_dir = repository.config_dir();
    if config_dir.is_dir() {
        std::fs::remove_dir_all(&config_dir)
            .with_context(|| format!("Failed to remove {}", config_dir.display()))?;
    }
    Ok(())
}

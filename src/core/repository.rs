//! Repository layout

use crate::core::{EffectiveConfig, PipelineError};
use std::path::{Component, Path, PathBuf};

/// Internal configuration directory inside the bare repository
pub const CONFIG_DIR: &str = "cricic";

/// Local configuration file inside [`CONFIG_DIR`]
pub const LOCAL_CONFIG: &str = "config.ini";

/// Default build description inside [`CONFIG_DIR`]
pub const BUILDFILE: &str = "buildfile";

/// Append-only action log inside [`CONFIG_DIR`]
pub const ACTION_LOG: &str = "cricic.log";

/// Lock file guarding build description updates
pub const BUILDFILE_LOCK: &str = "buildfile.lock";

/// File committed to the working tree to replace the build description
pub const STAGED_BUILDFILE: &str = ".cricicbuild";

/// Hooks installed into the bare repository
pub const HOOKS: [&str; 2] = ["pre-receive", "post-receive"];

/// A bare repository managed by cricic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name shown in reports (last path component)
    pub fn name(&self) -> String {
        self.root
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    pub fn local_config(&self) -> PathBuf {
        self.config_dir().join(LOCAL_CONFIG)
    }

    pub fn default_buildfile(&self) -> PathBuf {
        self.config_dir().join(BUILDFILE)
    }

    pub fn action_log(&self) -> PathBuf {
        self.config_dir().join(ACTION_LOG)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.config_dir().join(BUILDFILE_LOCK)
    }

    pub fn hook_path(&self, hook: &str) -> PathBuf {
        self.root.join("hooks").join(hook)
    }

    /// Build description configured in `[general] buildfile`
    pub fn buildfile(&self, config: &EffectiveConfig) -> Result<PathBuf, PipelineError> {
        Ok(self.root.join(config.get("general", "buildfile")?))
    }

    /// Check the parts that must exist before any configuration is read
    pub fn ensure_initialized(&self) -> Result<(), PipelineError> {
        if !self.config_dir().is_dir() {
            return Err(PipelineError::NotInitialized(
                "no cricic repository: did you initialise correctly?".to_string(),
            ));
        }
        if !self.local_config().is_file() {
            return Err(PipelineError::NotInitialized(
                "no local config: did you initialise correctly?".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the configured build description exists
    pub fn ensure_buildfile(&self, config: &EffectiveConfig) -> Result<PathBuf, PipelineError> {
        let buildfile = self.buildfile(config)?;
        if !buildfile.is_file() {
            return Err(PipelineError::NotInitialized(
                "no buildfile: did you initialise correctly?".to_string(),
            ));
        }
        Ok(buildfile)
    }

    /// Work directory from `[repository] work_dir`
    ///
    /// Relative paths are taken from the repository root, `~` expands to the
    /// user's home directory. The result is normalized without touching the
    /// filesystem, so it may not exist yet.
    pub fn work_dir(&self, config: &EffectiveConfig) -> Result<PathBuf, PipelineError> {
        let raw = config.get("repository", "work_dir")?;
        let path = expand_home(raw);
        let path = if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        };
        Ok(normalize(&path))
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Resolve `.` and `..` components lexically
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

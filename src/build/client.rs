//! Build tool configuration

use crate::core::{ConfigError, EffectiveConfig};
use std::time::Duration;

/// Configuration for the external build tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildToolConfig {
    /// Executable to run; defaults to `make` on PATH
    pub program: String,

    /// Upper bound for a single target; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for BuildToolConfig {
    fn default() -> Self {
        Self {
            program: "make".to_string(),
            timeout: None,
        }
    }
}

impl BuildToolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

}

/// Per-target bound from `[general] timeout` (seconds), if set
pub fn target_timeout(config: &EffectiveConfig) -> Result<Option<Duration>, ConfigError> {
    Ok(config
        .get_u64_opt("general", "timeout")?
        .map(Duration::from_secs))
}

//! Build stages and their settings

use crate::core::{ConfigError, EffectiveConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A configured stage of targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Runs before a push is accepted, and as the buildfile dry run
    Pre,
    /// Runs in the work directory after a push
    Post,
}

impl Stage {
    /// Config section holding this stage's settings
    pub fn section(&self) -> &'static str {
        match self {
            Stage::Pre => "pre",
            Stage::Post => "post",
        }
    }

    /// Targets from `targets`, split on spaces with empty entries dropped
    pub fn targets(&self, config: &EffectiveConfig) -> Result<Vec<String>, ConfigError> {
        Ok(config
            .get(self.section(), "targets")?
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect())
    }

    /// The stage's `silent` flag
    pub fn silent(&self, config: &EffectiveConfig) -> Result<bool, ConfigError> {
        config.get_bool(self.section(), "silent")
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.section().to_uppercase())
    }
}

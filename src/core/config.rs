//! Layered INI configuration
//!
//! Configuration is read from an ordered list of layers. Every layer is
//! parsed on its own and merged key by key into an [`EffectiveConfig`]:
//! a later layer overrides only the keys it defines, sections are additive.

use crate::core::Repository;
use ini::{Ini, ParseOption};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Built-in defaults compiled into the binary
pub const BUILTIN_CONFIG: &str = include_str!("../../conf/config.ini");

/// Errors raised while reading or querying configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {origin}: {message}")]
    Malformed { origin: String, message: String },

    #[error("missing config key [{section}] {key}")]
    MissingKey { section: String, key: String },

    #[error("invalid boolean for [{section}] {key}: {value:?}")]
    InvalidBool {
        section: String,
        key: String,
        value: String,
    },

    #[error("invalid number for [{section}] {key}: {value:?}")]
    InvalidNumber {
        section: String,
        key: String,
        value: String,
    },
}

/// One configuration layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Text compiled into the binary
    Builtin(&'static str),
    /// A file on disk; skipped when it does not exist
    File(PathBuf),
}

impl ConfigSource {
    fn origin(&self) -> String {
        match self {
            ConfigSource::Builtin(_) => "<builtin>".to_string(),
            ConfigSource::File(path) => path.display().to_string(),
        }
    }

    /// Load the layer text, `None` when the file is absent
    fn load(&self) -> Result<Option<String>, ConfigError> {
        match self {
            ConfigSource::Builtin(text) => Ok(Some((*text).to_string())),
            ConfigSource::File(path) => match std::fs::read_to_string(path) {
                Ok(content) => Ok(Some(content)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(source) => Err(ConfigError::Read {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }
}

/// Effective configuration after all layers have been merged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveConfig {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl EffectiveConfig {
    /// Parse a single INI document into a configuration
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Self::parse_layer(content, "<inline>")
    }

    fn parse_layer(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_str_opt(content, opt).map_err(|e| ConfigError::Malformed {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

        let mut config = Self::default();
        for (section, props) in ini.iter() {
            match section {
                Some(name) => {
                    let entries = config.sections.entry(name.to_string()).or_default();
                    for (key, value) in props.iter() {
                        entries.insert(key.to_lowercase(), value.to_string());
                    }
                }
                None => {
                    if let Some((key, _)) = props.iter().next() {
                        return Err(ConfigError::Malformed {
                            origin: origin.to_string(),
                            message: format!("key '{}' is not inside a section", key),
                        });
                    }
                }
            }
        }
        Ok(config)
    }

    /// Merge `other` on top of `self`, key by key
    pub fn merge(&mut self, other: EffectiveConfig) {
        for (section, entries) in other.sections {
            self.sections.entry(section).or_default().extend(entries);
        }
    }

    /// Set a single value
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_lowercase(), value.into());
    }

    /// Look up an optional value
    pub fn get_opt(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    /// Look up a required value
    pub fn get(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        self.get_opt(section, key)
            .ok_or_else(|| ConfigError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Look up a required boolean (`1/yes/true/on`, `0/no/false/off`)
    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool, ConfigError> {
        let value = self.get(section, key)?;
        match value.to_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                section: section.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Look up an optional unsigned number
    pub fn get_u64_opt(&self, section: &str, key: &str) -> Result<Option<u64>, ConfigError> {
        match self.get_opt(section, key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| ConfigError::InvalidNumber {
                section: section.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Names of all sections present
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

/// Resolves the effective configuration for a repository
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    locations: Vec<ConfigSource>,
}

impl ConfigResolver {
    /// Create a resolver reading the given global layers, in order
    pub fn new(locations: Vec<ConfigSource>) -> Self {
        Self { locations }
    }

    /// Built-in defaults followed by the system and user locations
    pub fn with_default_locations() -> Self {
        let mut locations = vec![
            ConfigSource::Builtin(BUILTIN_CONFIG),
            ConfigSource::File(PathBuf::from("/etc/cricic/config.ini")),
            ConfigSource::File(PathBuf::from("/usr/share/cricic/config.ini")),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            locations.push(ConfigSource::File(config_dir.join("cricic").join("config.ini")));
        }
        Self::new(locations)
    }

    /// Global layers this resolver reads before the repository
    pub fn locations(&self) -> &[ConfigSource] {
        &self.locations
    }

    /// Merge the global layers only
    pub fn resolve_global(&self) -> Result<EffectiveConfig, ConfigError> {
        self.resolve_layers(self.locations.iter())
    }

    /// Merge global layers, the repository's local config and the override
    pub fn resolve(
        &self,
        repository: &Repository,
        override_path: Option<&Path>,
    ) -> Result<EffectiveConfig, ConfigError> {
        let local = ConfigSource::File(repository.local_config());
        let extra = override_path.map(|p| ConfigSource::File(p.to_path_buf()));
        self.resolve_layers(
            self.locations
                .iter()
                .chain(std::iter::once(&local))
                .chain(extra.iter()),
        )
    }

    fn resolve_layers<'a>(
        &self,
        layers: impl Iterator<Item = &'a ConfigSource>,
    ) -> Result<EffectiveConfig, ConfigError> {
        let mut config = EffectiveConfig::default();
        for source in layers {
            match source.load()? {
                Some(content) => {
                    debug!("Reading config layer {}", source.origin());
                    config.merge(EffectiveConfig::parse_layer(&content, &source.origin())?);
                }
                None => debug!("Config layer {} not present, skipping", source.origin()),
            }
        }
        Ok(config)
    }
}

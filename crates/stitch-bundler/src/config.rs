//! File-based configuration.
//!
//! Priority: environment variables > `stitch.toml` > defaults.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::{Error, Result};

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE: &str = "stitch.toml";

/// Prefix of configuration environment variables (`STITCH_OUT_DIR`, ...).
pub const ENV_PREFIX: &str = "STITCH_";

/// Settings a build can take from `stitch.toml` or the environment.
///
/// Plugin lists are code-only and never come from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    pub out_dir: PathBuf,
    pub deps_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub reload: bool,
    pub optimize: bool,
    /// Silences progress logging and overrides `log_level`.
    pub quiet: bool,
    pub log_level: LogLevel,
    /// Import map JSON file. Relative paths are resolved against the root
    /// the config was loaded from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_map: Option<PathBuf>,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("dist"),
            deps_dir: PathBuf::from("deps"),
            cache_dir: PathBuf::from(".cache"),
            reload: false,
            optimize: false,
            quiet: false,
            log_level: LogLevel::Info,
            import_map: None,
        }
    }
}

impl StitchConfig {
    /// Load configuration for the project at `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut config: Self = Self::figment(root)
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        if let Some(import_map) = &config.import_map {
            if import_map.is_relative() {
                config.import_map = Some(root.join(import_map));
            }
        }

        Ok(config)
    }

    /// Level to log at once `quiet` is taken into account.
    pub fn effective_log_level(&self) -> LogLevel {
        if self.quiet {
            LogLevel::Silent
        } else {
            self.log_level
        }
    }

    /// The layered providers [`StitchConfig::load`] extracts from.
    pub fn figment(root: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(root.join(CONFIG_FILE)))
            .merge(Env::prefixed(ENV_PREFIX))
    }
}

//! Configuration for groupctl
//!
//! Loaded from TOML:
//!
//! ```toml
//! [store]
//! path = "data/control/plugins.db"
//!
//! [logging]
//! filter = "info"
//!
//! [services.weather]
//! disable_on_default = false
//! help = "weather forecast"
//! on_store_error = "fall_back_to_default"
//! ```
//!
//! Standard locations are `~/.groupctl/config.toml` then
//! `<project>/.groupctl/config.toml`. A later file replaces `store` and
//! `logging` only when it has those tables, and adds to (or overrides)
//! `services`. Unknown keys are rejected.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::control::ControlOptions;
use crate::error::ConfigError;

/// Default database location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/control/plugins.db";

const CONFIG_DIR: &str = ".groupctl";
const CONFIG_FILE: &str = "config.toml";

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    /// Services to register at startup, by name
    pub services: BTreeMap<String, ControlOptions>,
}

/// Database settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite file holding one table per service
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// One configuration file, keeping track of which tables it set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub store: Option<StoreConfig>,
    pub logging: Option<LoggingConfig>,
    pub services: BTreeMap<String, ControlOptions>,
}

impl ConfigLayer {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse(msg) => ConfigError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }
}

impl ControlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge(ConfigLayer::from_toml_str(content)?);
        Ok(config)
    }

    /// Load a single configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge(ConfigLayer::load(path)?);
        Ok(config)
    }

    /// Load from standard locations, falling back to defaults.
    pub fn load_standard(project_root: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_file = home.join(CONFIG_DIR).join(CONFIG_FILE);
            if user_file.is_file() {
                config.merge(ConfigLayer::load(&user_file)?);
            }
        }

        if let Some(root) = project_root {
            let project_file = root.join(CONFIG_DIR).join(CONFIG_FILE);
            if project_file.is_file() {
                config.merge(ConfigLayer::load(&project_file)?);
            }
        }

        Ok(config)
    }

    /// Apply `layer` on top of this configuration.
    pub fn merge(&mut self, layer: ConfigLayer) {
        if let Some(store) = layer.store {
            self.store = store;
        }
        if let Some(logging) = layer.logging {
            self.logging = logging;
        }
        self.services.extend(layer.services);
    }
}

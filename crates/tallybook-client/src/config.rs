use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::state::DataHome;
use crate::{ClientError, ClientResult};

pub const DEFAULT_USE_CASE: &str = "expenses";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Optional `config.toml` in the data home. Every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Use case tag written into a fresh store and into backups.
    pub use_case: String,
    pub log_filter: String,
    pub restore: RestoreConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestoreConfig {
    /// Check referential integrity of a backup before restoring it.
    pub deep_validate: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            use_case: DEFAULT_USE_CASE.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            restore: RestoreConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml(path: &Path, contents: &str) -> ClientResult<Self> {
        toml::from_str::<Self>(contents)
            .map_err(|error| ClientError::config_invalid(path, &error.to_string()))
    }
}

pub fn load_config(home: &DataHome) -> ClientResult<ClientConfig> {
    let path = home.config_path();
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ClientConfig::default());
    }

    debug!(path = %path.display(), "loading configuration");
    let contents = fs::read_to_string(&path)
        .map_err(|error| ClientError::config_invalid(&path, &error.to_string()))?;
    ClientConfig::from_toml(&path, &contents)
}

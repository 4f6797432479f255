//! Assistant configuration: an optional JSON file overlaid with
//! command-line values.

use crate::models::ModelConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up when none is given
pub const DEFAULT_CONFIG_PATH: &str = ".concierge/config.json";

/// Folder of task documents when none is given
pub const DEFAULT_TASKS_DIR: &str = "tasks";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the assistant needs to start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Folder of task documents
    #[serde(default = "default_tasks_dir")]
    pub tasks_dir: PathBuf,
    #[serde(default)]
    pub model: ModelConfig,
}

fn default_tasks_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TASKS_DIR)
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            tasks_dir: default_tasks_dir(),
            model: ModelConfig::default(),
        }
    }
}

/// Values supplied on the command line; `None` keeps the file's value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub tasks_dir: Option<PathBuf>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl AssistantConfig {
    /// Read a config file.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one
    /// is an error.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Overlay command-line values
    pub fn merge(&mut self, other: ConfigOverrides) {
        if let Some(dir) = other.tasks_dir {
            self.tasks_dir = dir;
        }
        if let Some(model) = other.model {
            self.model.model = model;
        }
        if other.api_key.is_some() {
            self.model.api_key = other.api_key;
        }
        if other.base_url.is_some() {
            self.model.base_url = other.base_url;
        }
    }
}

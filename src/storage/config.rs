//! Configuration handling for craftcost
//!
//! Configuration is read from `config.toml` in the platform config directory
//! (`~/.config/craftcost/config.toml` on Linux), or from an explicit path.
//! Command-line flags and environment variables take precedence over it.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dataset root used when neither a flag nor the config names one
pub const DEFAULT_DATAPACK_PATH: &str = "instance";

/// Default number of rows `items search` returns
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Instance or datapack directory to read recipes from
    pub datapack_path: Option<PathBuf>,

    /// Where item index databases live
    pub index_dir: Option<PathBuf>,

    /// Output format when `--format` is not given
    pub default_format: OutputFormat,

    /// Default row limit for `items search`
    pub search_limit: Option<usize>,
}

impl Config {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "craftcost", "craftcost")
    }

    /// Returns the default config file path
    pub fn default_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads from `path`, or the default location when `None`
    ///
    /// A missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "search_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Dataset root: explicit value, then config, then `instance`
    pub fn resolve_datapack_path(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.datapack_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATAPACK_PATH))
    }

    /// Index directory: explicit value, then config, then the platform cache dir
    pub fn resolve_index_dir(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.index_dir.clone())
            .or_else(|| Self::project_dirs().map(|dirs| dirs.cache_dir().to_path_buf()))
            .unwrap_or_else(|| std::env::temp_dir().join("craftcost-index"))
    }

    pub fn resolve_search_limit(&self, explicit: Option<usize>) -> usize {
        explicit
            .or(self.search_limit)
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
    }
}

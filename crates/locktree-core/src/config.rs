use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::DEFAULT_ALWAYS_INCLUDE;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocktreeConfig {
    pub version: u32,
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepositoryConfig {
    pub path: PathBuf,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default = "default_always_include")]
    pub always_include: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            always_include: default_always_include(),
        }
    }
}

fn default_always_include() -> Vec<String> {
    DEFAULT_ALWAYS_INCLUDE
        .iter()
        .map(|value| (*value).to_string())
        .collect()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

pub fn resolve_config_path() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs
        .home_dir()
        .join(".config")
        .join("locktree")
        .join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<LocktreeConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: LocktreeConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

pub fn validate_config(config: &LocktreeConfig) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("version must be {CONFIG_VERSION}"),
        });
    }

    if config.repository.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "repository.path must be non-empty".to_string(),
        });
    }

    if config.repository.name.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "repository.name must be non-empty".to_string(),
        });
    }

    for (index, marker) in config.filter.always_include.iter().enumerate() {
        if marker.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("filter.always_include[{index}] must be non-empty"),
            });
        }
    }

    Ok(())
}

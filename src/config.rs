use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analyzer::rules::VersionRule;
use crate::patch::types::PatchRule;
use crate::version::remotes::github::DEFAULT_BASE_URL;

/// Default resolution cache lifetime in milliseconds (1 hour)
pub const DEFAULT_CACHE_TTL_MS: i64 = 60 * 60 * 1000;

/// Log file name inside the data directory
pub const LOG_FILE_NAME: &str = "action-audit.log";

/// Top-level configuration, read from a JSON file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditConfig {
    pub cache: CacheConfig,
    pub github: GitHubConfig,
    pub analysis: AnalysisConfig,
    /// Replace or extend the default version rules
    pub rules: Vec<VersionRule>,
    /// Replace or extend the default patch catalog
    pub patches: Vec<PatchRule>,
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Resolution cache TTL in milliseconds
    pub ttl_ms: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_CACHE_TTL_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitHubConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Only analyze reusable workflows and composite action steps
    pub composite_only: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AuditConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the data directory for action-audit.
/// Uses $XDG_DATA_HOME/action-audit if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/action-audit,
/// or ./action-audit if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(LOG_FILE_NAME)
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("action-audit")
}

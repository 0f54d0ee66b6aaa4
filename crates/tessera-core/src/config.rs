use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::cache::CACHE_DIR_NAME;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Compiler options that control caching and scheduling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Cache directory, relative to the site root (default: .tessera-cache)
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Compile independent representations in parallel (default: false)
    #[serde(default)]
    pub parallel: bool,

    /// Drop cache entries of removed items after each run (default: true)
    #[serde(default = "default_true")]
    pub prune_cache: bool,
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> String {
    CACHE_DIR_NAME.to_string()
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            parallel: false,
            prune_cache: true,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TesseraConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

impl TesseraConfig {
    /// Load configuration from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))
            }
            _ => serde_json::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string())),
        }
    }

    /// Create a default configuration and write it to a JSON file
    pub fn init_file(path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&TesseraConfig::default())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

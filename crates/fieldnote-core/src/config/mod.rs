//! Configuration management for Fieldnote.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial file is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Fieldnote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Blob storage settings
    pub storage: StorageConfig,

    /// Record store settings
    pub records: RecordsConfig,

    /// Derivative target boxes
    pub derivatives: DerivativesConfig,

    /// Resource limits and stage timeouts
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.fieldnote.fieldnote/config.toml
    /// - Linux: ~/.config/fieldnote/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\fieldnote\config\config.toml
    ///
    /// Falls back to ~/.fieldnote/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "fieldnote", "fieldnote")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".fieldnote").join("config.toml")
            })
    }

    /// Resolved blob store root (with ~ expansion).
    pub fn blob_root(&self) -> PathBuf {
        expand(&self.storage.root)
    }

    /// Resolved record file path (with ~ expansion).
    pub fn records_path(&self) -> PathBuf {
        expand(&self.records.path)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.derivatives.thumbnail.width, 300);
        assert_eq!(config.derivatives.thumbnail.height, 300);
        assert_eq!(config.derivatives.display.width, 720);
        assert_eq!(config.derivatives.display.height, 480);
        assert_eq!(config.storage.original_dir, "original");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[storage]"));
        assert!(toml.contains("[derivatives.thumbnail]"));
        assert!(toml.contains("[limits]"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [derivatives.display]
            dir = "large"
            width = 1024
            height = 768
            "#,
        )
        .unwrap();
        assert_eq!(config.derivatives.display.width, 1024);
        assert_eq!(config.derivatives.display.dir, "large");
        assert_eq!(config.derivatives.thumbnail.width, 300);
        assert_eq!(config.limits.extract_timeout_ms, 5000);
    }

    #[test]
    fn test_tilde_expansion() {
        let mut config = Config::default();
        config.storage.root = "/srv/fieldnote/files".to_string();
        assert_eq!(config.blob_root(), PathBuf::from("/srv/fieldnote/files"));
        config.records.path = "relative/sightings.json".to_string();
        assert_eq!(config.records_path(), PathBuf::from("relative/sightings.json"));
    }
}

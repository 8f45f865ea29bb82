//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Blob store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding all artifacts
    pub root: String,

    /// Directory (under root) for uploaded originals
    pub original_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "~/.fieldnote/files".to_string(),
            original_dir: "original".to_string(),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// JSON file holding every sighting
    pub path: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            path: "~/.fieldnote/sightings.json".to_string(),
        }
    }
}

/// One resized variant: a bounding box and the directory it is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeSpec {
    /// Directory (under the blob root) receiving this variant
    pub dir: String,

    /// Bounding box width in pixels
    pub width: u32,

    /// Bounding box height in pixels
    pub height: u32,
}

impl DerivativeSpec {
    pub fn new(dir: &str, width: u32, height: u32) -> Self {
        Self {
            dir: dir.to_string(),
            width,
            height,
        }
    }
}

/// The two variants every sighting carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivativesConfig {
    /// Small list/map-marker preview
    pub thumbnail: DerivativeSpec,

    /// Medium detail view
    pub display: DerivativeSpec,
}

impl Default for DerivativesConfig {
    fn default() -> Self {
        Self {
            thumbnail: DerivativeSpec::new("thumb", 300, 300),
            display: DerivativeSpec::new("img", 720, 480),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum decoded image dimension (width or height)
    pub max_image_dimension: u32,

    /// Storing the original
    pub store_timeout_ms: u64,

    /// Metadata extraction
    pub extract_timeout_ms: u64,

    /// Each derivative
    pub derive_timeout_ms: u64,

    /// Record store commit
    pub commit_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            max_image_dimension: 10000,
            store_timeout_ms: 10000,
            extract_timeout_ms: 5000,
            derive_timeout_ms: 30000,
            commit_timeout_ms: 10000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

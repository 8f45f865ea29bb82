//! Error types for the Fieldnote ingestion pipeline.
//!
//! Errors are organized by component so each failure carries the context an
//! operator needs (artifact reference, stage reached, orphaned blobs).

use std::path::PathBuf;
use thiserror::Error;

use crate::blob::BlobRef;
use crate::pipeline::Stage;
use crate::types::SightingId;

/// Top-level error type for Fieldnote operations.
#[derive(Error, Debug)]
pub enum FieldNoteError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Blob store errors
    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),

    /// Record store errors
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// Ingestion outcome errors
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Blob store errors.
#[derive(Error, Debug)]
pub enum BlobError {
    /// No blob exists at the reference
    #[error("Blob not found: {0}")]
    NotFound(BlobRef),

    /// Reference escapes the store root or is otherwise unusable
    #[error("Invalid blob reference: {0}")]
    InvalidReference(String),

    /// Underlying medium failed
    #[error("Blob I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Record store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with the given id
    #[error("Sighting not found: {0}")]
    NotFound(SightingId),

    /// Persisting the collection failed
    #[error("Record store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted collection could not be encoded or decoded
    #[error("Record store encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Malformed geotag readings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// Degrees/minutes/seconds must have exactly three components
    #[error("expected 3 DMS components, found {found}")]
    Arity { found: usize },

    /// NaN or infinite component
    #[error("DMS component {index} is not finite")]
    NonFinite { index: usize },

    /// Sign belongs to the hemisphere, not the components
    #[error("DMS component {index} is negative")]
    Negative { index: usize },

    /// Unknown hemisphere reference, or one on the wrong axis
    #[error("invalid hemisphere reference {0:?}")]
    Hemisphere(String),

    /// Decimal value outside the valid range for its axis
    #[error("{axis} {value} is out of range")]
    OutOfRange { axis: &'static str, value: f64 },
}

/// Pipeline stage errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Upload rejected before any stage ran
    #[error("Invalid upload {name}: {message}")]
    Validation { name: String, message: String },

    /// Writing or reading the original failed
    #[error("Storage failed: {0}")]
    Storage(#[from] BlobError),

    /// Metadata extraction could not run (the pipeline degrades on this)
    #[error("Metadata extraction failed: {0}")]
    Metadata(String),

    /// A derivative could not be produced
    #[error("Derivative {target} of {source_ref} failed: {message}")]
    Derivation {
        source_ref: BlobRef,
        target: String,
        message: String,
    },

    /// The record store refused the commit
    #[error("Commit failed: {0}")]
    Commit(#[from] StoreError),

    /// A stage's background task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),

    /// Stage exceeded its time budget
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: &'static str, timeout_ms: u64 },
}

/// Outcome of a failed ingestion, edit or delete.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Malformed input; nothing was attempted
    #[error("{0}")]
    Validation(PipelineError),

    /// Target record does not exist; nothing was attempted
    #[error("Sighting not found: {0}")]
    NotFound(SightingId),

    /// Fatal failure with no side effects left behind
    #[error("Rejected at {reached}: {source}")]
    Rejected {
        reached: Stage,
        #[source]
        source: PipelineError,
    },

    /// Blobs were written but no record references them
    #[error("Partially failed after {reached}: {source} ({} orphaned artifact(s))", .orphans.len())]
    PartiallyFailed {
        reached: Stage,
        #[source]
        source: PipelineError,
        orphans: Vec<BlobRef>,
    },

    /// Record store failure outside the ingestion stages
    #[error("Record store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => IngestError::NotFound(id),
            other => IngestError::Store(other),
        }
    }
}

/// Convenience type alias for Fieldnote results.
pub type Result<T> = std::result::Result<T, FieldNoteError>;

/// Convenience type alias for pipeline-stage results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Convenience type alias for blob store results.
pub type BlobResult<T> = std::result::Result<T, BlobError>;

/// Convenience type alias for record store results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

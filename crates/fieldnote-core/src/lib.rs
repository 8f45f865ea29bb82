//! Fieldnote Core - geotagged sighting ingestion.
//!
//! Fieldnote stores an uploaded photo, reads its embedded GPS position,
//! produces a thumbnail and a display-size copy, and commits all three
//! artifacts together with the user's notes as one sighting record.
//!
//! # Architecture
//!
//! ```text
//! Upload → Store original → Read geotag → Thumbnail → Display copy → Commit
//! ```
//!
//! A stage that cannot complete either rejects the request outright (nothing
//! written) or reports a partial failure naming the blobs it left behind.
//! A missing or unreadable geotag is never a failure.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fieldnote_core::{Config, CreateRequest, FieldNotes, Upload};
//!
//! #[tokio::main]
//! async fn main() -> fieldnote_core::Result<()> {
//!     let notes = FieldNotes::open(Config::load()?).await?;
//!     let bytes = std::fs::read("heron.jpg")?;
//!
//!     let reply = notes
//!         .service()
//!         .create(CreateRequest {
//!             upload: Some(Upload::new("heron.jpg", bytes)),
//!             ..Default::default()
//!         })
//!         .await;
//!     println!("{}", serde_json::to_string(&reply)?);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod blob;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod types;

use std::sync::Arc;

// Re-exports for convenient access
pub use blob::{BlobRef, BlobStore, LocalBlobStore};
pub use config::Config;
pub use error::{
    BlobError, ConfigError, CoordinateError, FieldNoteError, IngestError, PipelineError,
    PipelineResult, Result, StoreError,
};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{IngestPipeline, IngestReport, Stage};
pub use service::{CreateRequest, EditRequest, ErrorKind, Reply, SightingService};
pub use store::{JsonRecordStore, MemoryRecordStore, RecordStore};
pub use types::{
    Artifacts, Coordinates, MetadataStatus, Sighting, SightingId, TextFields, Upload,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A configured Fieldnote instance: local blob storage plus the JSON record file.
pub struct FieldNotes {
    config: Config,
    service: SightingService,
}

impl FieldNotes {
    /// Open the stores named by `config`.
    pub async fn open(config: Config) -> Result<Self> {
        tracing::debug!("Initializing Fieldnote v{}", VERSION);

        let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::from_config(&config));
        let records: Arc<dyn RecordStore> = Arc::new(JsonRecordStore::from_config(&config).await?);
        let service = SightingService::new(blobs, records, &config);

        Ok(Self { config, service })
    }

    /// Open with the configuration from the default location.
    pub async fn with_defaults() -> Result<Self> {
        let config = Config::load()?;
        Self::open(config).await
    }

    pub fn service(&self) -> &SightingService {
        &self.service
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

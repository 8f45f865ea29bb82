//! Sighting ingestion pipeline components.
//!
//! - **validate**: Pre-ingestion checks on the upload
//! - **metadata**: Read the EXIF geotag from the stored original
//! - **coordinates**: Degrees/minutes/seconds to signed decimal degrees
//! - **derive**: Thumbnail and display-size copies of the original
//! - **ingest**: Orchestrates the stages and commits the record

pub mod coordinates;
pub mod derive;
pub mod ingest;
pub mod metadata;
pub mod validate;

// Re-exports for convenient access
pub use coordinates::{normalize, Axis, Hemisphere};
pub use derive::{fit_within, DerivativeGenerator};
pub use ingest::{IngestPipeline, IngestReport, Stage};
pub use metadata::{DmsReading, Extraction, GeoTag, MetadataExtractor};
pub use validate::Validator;

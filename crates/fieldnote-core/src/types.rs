//! Core data types for sightings and the requests that produce them.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::blob::BlobRef;
use crate::error::CoordinateError;

/// Opaque record identifier, assigned by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SightingId(Uuid);

impl SightingId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SightingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SightingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SightingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A validated decimal-degree position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build a position, rejecting values outside `[-90, 90]` / `[-180, 180]`.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::OutOfRange {
                axis: "latitude",
                value: lat,
            });
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::OutOfRange {
                axis: "longitude",
                value: lng,
            });
        }
        Ok(Self { lat, lng })
    }
}

/// The three blob references produced by one ingestion pass.
///
/// Held as a unit so a record can never reference only some of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    pub thumbnail_ref: BlobRef,
    pub display_ref: BlobRef,
    pub original_ref: BlobRef,
}

impl Artifacts {
    /// All three references, original first.
    pub fn refs(&self) -> [&BlobRef; 3] {
        [&self.original_ref, &self.thumbnail_ref, &self.display_ref]
    }

    /// Owned copies of all three references.
    pub fn into_refs(self) -> Vec<BlobRef> {
        vec![self.original_ref, self.thumbnail_ref, self.display_ref]
    }
}

/// A persisted field note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub id: SightingId,

    /// Authenticated creator; absent in single-tenant deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Server clock at ingestion (refreshed by edits)
    pub captured_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Present only when the source image carried a usable geotag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,

    #[serde(flatten)]
    pub artifacts: Artifacts,
}

/// User-entered text. `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl TextFields {
    /// Check whether no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.title.is_none() && self.details.is_none()
    }
}

/// Field set handed to [`RecordStore::create`](crate::store::RecordStore::create).
#[derive(Debug, Clone)]
pub struct NewSighting {
    pub owner: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub text: TextFields,
    pub coordinates: Option<Coordinates>,
    pub artifacts: Artifacts,
}

/// Replacement media from an edit that carried a new image.
#[derive(Debug, Clone)]
pub struct MediaPatch {
    pub artifacts: Artifacts,
    /// Replaces the stored coordinates, including clearing them
    pub coordinates: Option<Coordinates>,
}

/// Partial update applied atomically by the record store.
#[derive(Debug, Clone)]
pub struct SightingPatch {
    pub captured_at: DateTime<Utc>,
    pub text: TextFields,
    pub media: Option<MediaPatch>,
}

impl SightingPatch {
    /// Apply to a record in place. Supplied text fields overwrite, the rest stay.
    pub fn apply(self, sighting: &mut Sighting) {
        sighting.captured_at = self.captured_at;
        if let Some(category) = self.text.category {
            sighting.category = Some(category);
        }
        if let Some(title) = self.text.title {
            sighting.title = Some(title);
        }
        if let Some(details) = self.text.details {
            sighting.details = Some(details);
        }
        if let Some(media) = self.media {
            sighting.artifacts = media.artifacts;
            sighting.coordinates = media.coordinates;
        }
    }
}

/// An uploaded image as received from the caller.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-side file name; only its extension is kept
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// How the geotag lookup for an ingested image ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetadataStatus {
    /// Coordinates were extracted and normalized
    Located,
    /// The image carries no geotag
    NotPresent,
    /// Metadata was present but unusable; coordinates left unset
    Unreadable { message: String },
}

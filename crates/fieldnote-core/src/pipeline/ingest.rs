//! Ingestion orchestration - sequences storage, metadata, derivatives and commit.
//!
//! Each stage consumes the previous stage's context and returns the next one,
//! or a tagged error the orchestrator returns immediately:
//!
//! ```text
//! Received -> Stored -> MetadataResolved -> DerivativesReady -> Committed
//!    |          |                               |                 |
//! Rejected   (degrades, never fails)      PartiallyFailed   PartiallyFailed
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::derive::DerivativeGenerator;
use super::metadata::{Extraction, MetadataExtractor};
use super::validate::Validator;
use crate::blob::{BlobRef, BlobStore};
use crate::config::{Config, DerivativeSpec, DerivativesConfig, LimitsConfig};
use crate::error::{BlobError, IngestError, PipelineError, PipelineResult, StoreResult};
use crate::store::RecordStore;
use crate::types::{
    Artifacts, Coordinates, MediaPatch, MetadataStatus, NewSighting, Sighting, SightingId,
    SightingPatch, TextFields, Upload,
};

/// States an ingestion request moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Stored,
    MetadataResolved,
    DerivativesReady,
    Committed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Stored => "stored",
            Stage::MetadataResolved => "metadata_resolved",
            Stage::DerivativesReady => "derivatives_ready",
            Stage::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// A committed record plus how its geotag lookup went.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub sighting: Sighting,
    /// `None` for text-only edits, which never look at an image
    pub metadata: Option<MetadataStatus>,
}

struct Received {
    upload: Upload,
}

struct Stored {
    original: BlobRef,
}

struct MetadataResolved {
    original: BlobRef,
    coordinates: Option<Coordinates>,
    metadata: MetadataStatus,
}

struct DerivativesReady {
    artifacts: Artifacts,
    coordinates: Option<Coordinates>,
    metadata: MetadataStatus,
}

/// Sequences one upload through every stage and commits the result.
///
/// Holds no per-request state; concurrent requests only meet in the stores.
pub struct IngestPipeline {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn RecordStore>,
    validator: Validator,
    generator: DerivativeGenerator,
    derivatives: DerivativesConfig,
    limits: LimitsConfig,
}

impl IngestPipeline {
    /// Create a pipeline over the given stores.
    pub fn new(blobs: Arc<dyn BlobStore>, records: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            blobs,
            records,
            validator: Validator::new(config.limits.clone()),
            generator: DerivativeGenerator::new(config.limits.clone()),
            derivatives: config.derivatives.clone(),
            limits: config.limits.clone(),
        }
    }

    /// The record store this pipeline commits to.
    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    /// Ingest a new upload and create a record for it.
    pub async fn create(
        &self,
        upload: Upload,
        text: TextFields,
        owner: Option<String>,
    ) -> Result<IngestReport, IngestError> {
        let start = Instant::now();
        let ready = self.ingest(upload).await?;

        let new = NewSighting {
            owner,
            captured_at: Utc::now(),
            text,
            coordinates: ready.coordinates,
            artifacts: ready.artifacts.clone(),
        };
        let records = Arc::clone(&self.records);
        let sighting = self
            .commit(&ready.artifacts, async move { records.create(new).await })
            .await?;

        tracing::debug!(
            "Created sighting {} in {:?} ({:?})",
            sighting.id,
            start.elapsed(),
            ready.metadata
        );
        Ok(IngestReport {
            sighting,
            metadata: Some(ready.metadata),
        })
    }

    /// Edit a record, replacing its image when `upload` is given.
    ///
    /// Without an upload only the supplied text fields and `captured_at`
    /// change; artifacts and coordinates stay as they are.
    pub async fn edit(
        &self,
        id: &SightingId,
        upload: Option<Upload>,
        text: TextFields,
    ) -> Result<IngestReport, IngestError> {
        let Some(upload) = upload else {
            return self.edit_text(id, text).await;
        };

        let start = Instant::now();
        let previous = self.records.find_by_id(id).await?;
        let ready = self.ingest(upload).await?;

        let patch = SightingPatch {
            captured_at: Utc::now(),
            text,
            media: Some(MediaPatch {
                artifacts: ready.artifacts.clone(),
                coordinates: ready.coordinates,
            }),
        };
        let records = Arc::clone(&self.records);
        let id = *id;
        let sighting = self
            .commit(&ready.artifacts, async move {
                records.update_by_id(&id, patch).await
            })
            .await?;

        let replaced: Vec<BlobRef> = previous
            .artifacts
            .into_refs()
            .into_iter()
            .filter(|r| !sighting.artifacts.refs().contains(&r))
            .collect();
        self.reclaim(&replaced).await;

        tracing::debug!("Replaced image of sighting {} in {:?}", sighting.id, start.elapsed());
        Ok(IngestReport {
            sighting,
            metadata: Some(ready.metadata),
        })
    }

    /// Delete a record, then reclaim its three artifacts.
    ///
    /// Blob cleanup is best-effort: once the record is gone nothing references
    /// the blobs, so a failed unlink is logged rather than reported.
    pub async fn delete(&self, id: &SightingId) -> Result<Sighting, IngestError> {
        let removed = self.records.delete_by_id(id).await?;
        let refs = removed.artifacts.clone().into_refs();
        self.reclaim(&refs).await;
        tracing::debug!("Deleted sighting {}", removed.id);
        Ok(removed)
    }

    /// Stages 1-3, shared by create and image-replacing edits.
    async fn ingest(&self, upload: Upload) -> Result<DerivativesReady, IngestError> {
        self.validator
            .validate(&upload)
            .map_err(IngestError::Validation)?;

        let stage_start = Instant::now();
        let stored = self.store_original(Received { upload }).await?;
        tracing::trace!("  Store: {:?}", stage_start.elapsed());

        let stage_start = Instant::now();
        let resolved = self.resolve_metadata(stored).await;
        tracing::trace!("  Metadata: {:?}", stage_start.elapsed());

        let stage_start = Instant::now();
        let ready = self.derive_all(resolved).await?;
        tracing::trace!("  Derivatives: {:?}", stage_start.elapsed());

        Ok(ready)
    }

    /// `Received -> Stored`. Any failure is fatal and leaves nothing behind.
    async fn store_original(&self, received: Received) -> Result<Stored, IngestError> {
        let Received { upload } = received;
        let blobs = &self.blobs;

        let stored = within("store", self.limits.store_timeout_ms, async {
            Ok(blobs.store(upload.bytes.clone(), &upload.file_name).await?)
        })
        .await;

        match stored {
            Ok(original) => Ok(Stored { original }),
            Err(source) => {
                tracing::warn!("Rejected upload {:?}: {}", upload.file_name, source);
                Err(IngestError::Rejected {
                    reached: Stage::Received,
                    source,
                })
            }
        }
    }

    /// `Stored -> MetadataResolved`. Never fails: a missing or unreadable
    /// geotag just leaves the coordinates unset.
    async fn resolve_metadata(&self, stored: Stored) -> MetadataResolved {
        let Stored { original } = stored;
        let blobs = &self.blobs;
        let source = &original;

        let outcome = within("extract", self.limits.extract_timeout_ms, async {
            let bytes = blobs.read(source).await?;
            tokio::task::spawn_blocking(move || MetadataExtractor::extract(&bytes))
                .await
                .map_err(|e| PipelineError::Metadata(format!("task join error: {e}")))
        })
        .await;

        let (coordinates, metadata) = match outcome {
            Ok(Extraction::Tagged(tag)) => match tag.to_coordinates() {
                Ok(coordinates) => (Some(coordinates), MetadataStatus::Located),
                Err(e) => {
                    tracing::warn!("Malformed geotag in {}: {}", original, e);
                    (
                        None,
                        MetadataStatus::Unreadable {
                            message: format!("malformed geotag: {e}"),
                        },
                    )
                }
            },
            Ok(Extraction::NotPresent) => {
                tracing::debug!("No geotag in {}", original);
                (None, MetadataStatus::NotPresent)
            }
            Ok(Extraction::Failed(message)) => {
                tracing::warn!("Unreadable metadata in {}: {}", original, message);
                (None, MetadataStatus::Unreadable { message })
            }
            Err(e) => {
                tracing::warn!("Metadata extraction for {} failed: {}", original, e);
                (
                    None,
                    MetadataStatus::Unreadable {
                        message: e.to_string(),
                    },
                )
            }
        };

        MetadataResolved {
            original,
            coordinates,
            metadata,
        }
    }

    /// `MetadataResolved -> DerivativesReady`. Thumbnail first, then display;
    /// either failing aborts with the already written blobs as orphans.
    async fn derive_all(&self, resolved: MetadataResolved) -> Result<DerivativesReady, IngestError> {
        let MetadataResolved {
            original,
            coordinates,
            metadata,
        } = resolved;

        let thumbnail_ref = match self.derive_one(&original, &self.derivatives.thumbnail).await {
            Ok(reference) => reference,
            Err(source) => {
                let mut orphans = vec![original.clone()];
                orphans.extend(possibly_written(&source, &original, &self.derivatives.thumbnail));
                return Err(partially_failed(Stage::MetadataResolved, source, orphans));
            }
        };

        let display_ref = match self.derive_one(&original, &self.derivatives.display).await {
            Ok(reference) => reference,
            Err(source) => {
                let mut orphans = vec![original.clone(), thumbnail_ref];
                orphans.extend(possibly_written(&source, &original, &self.derivatives.display));
                return Err(partially_failed(Stage::MetadataResolved, source, orphans));
            }
        };

        Ok(DerivativesReady {
            artifacts: Artifacts {
                thumbnail_ref,
                display_ref,
                original_ref: original,
            },
            coordinates,
            metadata,
        })
    }

    async fn derive_one(&self, source: &BlobRef, spec: &DerivativeSpec) -> PipelineResult<BlobRef> {
        within(
            "derive",
            self.limits.derive_timeout_ms,
            self.generator.derive(self.blobs.as_ref(), source, spec),
        )
        .await
    }

    /// `DerivativesReady -> Committed`. A store failure leaves all three
    /// artifacts orphaned; they are logged for operator cleanup, not retried.
    async fn commit<F>(&self, artifacts: &Artifacts, write: F) -> Result<Sighting, IngestError>
    where
        F: Future<Output = StoreResult<Sighting>> + Send + 'static,
    {
        let committed = write_detached(self.limits.commit_timeout_ms, write).await;

        committed.map_err(|source| {
            partially_failed(Stage::DerivativesReady, source, artifacts.clone().into_refs())
        })
    }

    /// Text-only edit: no stage runs, only the record changes.
    async fn edit_text(&self, id: &SightingId, text: TextFields) -> Result<IngestReport, IngestError> {
        let patch = SightingPatch {
            captured_at: Utc::now(),
            text,
            media: None,
        };
        let records = Arc::clone(&self.records);
        let id = *id;

        let updated = write_detached(self.limits.commit_timeout_ms, async move {
            records.update_by_id(&id, patch).await
        })
        .await;

        match updated {
            Ok(sighting) => Ok(IngestReport {
                sighting,
                metadata: None,
            }),
            Err(PipelineError::Commit(err)) => Err(err.into()),
            Err(source) => Err(IngestError::Rejected {
                reached: Stage::Received,
                source,
            }),
        }
    }

    /// Delete blobs nothing references any more. Failures are only logged.
    async fn reclaim(&self, refs: &[BlobRef]) {
        for reference in refs {
            match self.blobs.delete(reference).await {
                Ok(()) => {}
                Err(BlobError::NotFound(_)) => {
                    tracing::warn!("Artifact {} was already gone", reference);
                }
                Err(e) => {
                    tracing::warn!("Could not reclaim artifact {}: {}", reference, e);
                }
            }
        }
    }
}

/// Run a stage future under its time budget.
async fn within<T>(
    stage: &'static str,
    timeout_ms: u64,
    fut: impl Future<Output = PipelineResult<T>>,
) -> PipelineResult<T> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(PipelineError::Timeout { stage, timeout_ms }),
    }
}

/// Run a record store write under the commit budget without cancelling it.
///
/// The write runs as its own task, so a timeout only stops the waiting. The
/// store still finishes the mutation and its file and memory stay in step;
/// the record may then exist even though the caller was told it failed.
async fn write_detached<F>(timeout_ms: u64, write: F) -> PipelineResult<Sighting>
where
    F: Future<Output = StoreResult<Sighting>> + Send + 'static,
{
    let handle = tokio::spawn(write);
    within("commit", timeout_ms, async {
        match handle.await {
            Ok(written) => Ok(written?),
            Err(e) => Err(PipelineError::Task(e.to_string())),
        }
    })
    .await
}

/// A timed-out derivative may still land on disk after we gave up on it.
fn possibly_written(
    error: &PipelineError,
    original: &BlobRef,
    spec: &DerivativeSpec,
) -> Option<BlobRef> {
    match error {
        PipelineError::Timeout { .. } => Some(original.sibling_in(&spec.dir)),
        _ => None,
    }
}

fn partially_failed(reached: Stage, source: PipelineError, orphans: Vec<BlobRef>) -> IngestError {
    let listed: Vec<&str> = orphans.iter().map(BlobRef::as_str).collect();
    tracing::error!(
        "Ingestion failed after {}: {}; orphaned artifacts need cleanup: {}",
        reached,
        source,
        listed.join(", ")
    );
    IngestError::PartiallyFailed {
        reached,
        source,
        orphans,
    }
}

//! Request/reply boundary in front of the ingestion pipeline.
//!
//! Callers hand over requests and get a [`Reply`] that is always safe to
//! serialize straight back to a client: `{"status":"OK", ...}` on success,
//! `{"status":"error","kind":..., "message":...}` otherwise.

use serde::Serialize;
use std::sync::Arc;

use crate::blob::{BlobRef, BlobStore};
use crate::config::Config;
use crate::error::{IngestError, PipelineError, StoreResult};
use crate::pipeline::{IngestPipeline, IngestReport};
use crate::store::RecordStore;
use crate::types::{MetadataStatus, Sighting, SightingId, TextFields, Upload};

/// Create a sighting from an uploaded image.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// Required; a request without an image is a validation error
    pub upload: Option<Upload>,
    pub fields: TextFields,
    pub owner: Option<String>,
}

/// Edit a sighting's text, and optionally replace its image.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub id: SightingId,
    pub upload: Option<Upload>,
    pub fields: TextFields,
}

/// Failure category reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Rejected,
    PartiallyFailed,
    Store,
}

/// Structured reply for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum Reply {
    #[serde(rename = "OK")]
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        record: Option<Sighting>,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<MetadataStatus>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename = "error")]
    Error {
        kind: ErrorKind,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        orphans: Vec<BlobRef>,
    },
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok { .. })
    }

    /// The record carried by a successful reply.
    pub fn record(&self) -> Option<&Sighting> {
        match self {
            Reply::Ok { record, .. } => record.as_ref(),
            Reply::Error { .. } => None,
        }
    }

    /// The error category, if this is an error reply.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Reply::Ok { .. } => None,
            Reply::Error { kind, .. } => Some(*kind),
        }
    }

    fn ingested(report: IngestReport) -> Self {
        Reply::Ok {
            record: Some(report.sighting),
            metadata: report.metadata,
            message: None,
        }
    }
}

impl From<IngestError> for Reply {
    fn from(err: IngestError) -> Self {
        let message = err.to_string();
        let (kind, orphans) = match err {
            IngestError::Validation(_) => (ErrorKind::Validation, Vec::new()),
            IngestError::NotFound(_) => (ErrorKind::NotFound, Vec::new()),
            IngestError::Rejected { .. } => (ErrorKind::Rejected, Vec::new()),
            IngestError::PartiallyFailed { orphans, .. } => (ErrorKind::PartiallyFailed, orphans),
            IngestError::Store(_) => (ErrorKind::Store, Vec::new()),
        };
        Reply::Error {
            kind,
            message,
            orphans,
        }
    }
}

/// Front door for create, edit, delete and list.
pub struct SightingService {
    pipeline: IngestPipeline,
}

impl SightingService {
    pub fn new(blobs: Arc<dyn BlobStore>, records: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            pipeline: IngestPipeline::new(blobs, records, config),
        }
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.pipeline
    }

    pub async fn create(&self, request: CreateRequest) -> Reply {
        let CreateRequest {
            upload,
            fields,
            owner,
        } = request;

        let Some(upload) = upload else {
            return IngestError::Validation(PipelineError::Validation {
                name: "upload".to_string(),
                message: "no file attached".to_string(),
            })
            .into();
        };

        match self.pipeline.create(upload, fields, owner).await {
            Ok(report) => Reply::ingested(report),
            Err(e) => e.into(),
        }
    }

    pub async fn edit(&self, request: EditRequest) -> Reply {
        let EditRequest { id, upload, fields } = request;
        match self.pipeline.edit(&id, upload, fields).await {
            Ok(report) => Reply::ingested(report),
            Err(e) => e.into(),
        }
    }

    pub async fn delete(&self, id: &SightingId) -> Reply {
        match self.pipeline.delete(id).await {
            Ok(_) => Reply::Ok {
                record: None,
                metadata: None,
                message: Some("Removed".to_string()),
            },
            Err(e) => e.into(),
        }
    }

    /// Records belonging to `owner`, oldest first.
    pub async fn list(&self, owner: Option<&str>) -> StoreResult<Vec<Sighting>> {
        self.pipeline.records().find_by_owner(owner).await
    }
}

//! Record store persisted to a single JSON file.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::collection::Collection;
use super::RecordStore;
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::types::{NewSighting, Sighting, SightingId, SightingPatch};

/// Record store backed by a JSON array on disk.
///
/// A mutation builds the next collection, writes it to a temporary file,
/// syncs it and renames it over the old one. Memory is only updated once
/// the rename succeeded, so a failed write changes nothing.
pub struct JsonRecordStore {
    path: PathBuf,
    records: RwLock<Collection>,
}

impl JsonRecordStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let records = match fs::read(&path).await {
            Ok(data) => {
                let records: Vec<Sighting> = serde_json::from_slice(&data)?;
                tracing::debug!("Loaded {} sighting(s) from {:?}", records.len(), path);
                Collection::from_records(records)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No record file at {:?}, starting empty", path);
                Collection::default()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Open the store named by the `[records]` section of the config.
    pub async fn from_config(config: &Config) -> StoreResult<Self> {
        Self::open(config.records_path()).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &Collection) -> StoreResult<()> {
        let io = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let data = serde_json::to_vec_pretty(&records.to_sorted())?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(io)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await.map_err(io)?;
        file.write_all(&data).await.map_err(io)?;
        file.sync_all().await.map_err(io)?;
        drop(file);

        fs::rename(&tmp, &self.path).await.map_err(io)?;
        Ok(())
    }

    /// Run a mutation against a copy and publish it only if it persisted.
    ///
    /// Dropping this future after the rename but before the publish leaves
    /// the file ahead of memory, so callers with a deadline run it as its
    /// own task.
    async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Collection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut guard = self.records.write().await;
        let mut next = guard.clone();
        let value = apply(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(value)
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn create(&self, new: NewSighting) -> StoreResult<Sighting> {
        self.mutate(|records| Ok(records.create(new))).await
    }

    async fn find_by_owner(&self, owner: Option<&str>) -> StoreResult<Vec<Sighting>> {
        Ok(self.records.read().await.find_by_owner(owner))
    }

    async fn find_by_id(&self, id: &SightingId) -> StoreResult<Sighting> {
        self.records.read().await.find_by_id(id)
    }

    async fn update_by_id(&self, id: &SightingId, patch: SightingPatch) -> StoreResult<Sighting> {
        self.mutate(|records| records.update(id, patch)).await
    }

    async fn delete_by_id(&self, id: &SightingId) -> StoreResult<Sighting> {
        self.mutate(|records| records.delete(id)).await
    }
}

//! In-memory record store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::collection::Collection;
use super::RecordStore;
use crate::error::StoreResult;
use crate::types::{NewSighting, Sighting, SightingId, SightingPatch};

/// Record store that lives only as long as the process.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Collection>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Every record regardless of owner, oldest first.
    pub async fn all(&self) -> Vec<Sighting> {
        self.records.read().await.to_sorted()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, new: NewSighting) -> StoreResult<Sighting> {
        Ok(self.records.write().await.create(new))
    }

    async fn find_by_owner(&self, owner: Option<&str>) -> StoreResult<Vec<Sighting>> {
        Ok(self.records.read().await.find_by_owner(owner))
    }

    async fn find_by_id(&self, id: &SightingId) -> StoreResult<Sighting> {
        self.records.read().await.find_by_id(id)
    }

    async fn update_by_id(&self, id: &SightingId, patch: SightingPatch) -> StoreResult<Sighting> {
        self.records.write().await.update(id, patch)
    }

    async fn delete_by_id(&self, id: &SightingId) -> StoreResult<Sighting> {
        self.records.write().await.delete(id)
    }
}

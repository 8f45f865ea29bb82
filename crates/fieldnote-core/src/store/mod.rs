//! Persistent sighting records.
//!
//! - **RecordStore**: async trait the pipeline commits through
//! - **MemoryRecordStore**: in-process map
//! - **JsonRecordStore**: the same map persisted to a JSON file

mod collection;
mod json;
mod memory;

pub use json::JsonRecordStore;
pub use memory::MemoryRecordStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{NewSighting, Sighting, SightingId, SightingPatch};

/// Collection of sightings keyed by id and scoped by owner.
///
/// Each mutation is atomic for its record: readers see either the old or the
/// new field set, never a mix.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record with a freshly assigned id.
    async fn create(&self, new: NewSighting) -> StoreResult<Sighting>;

    /// Records whose owner equals `owner`, oldest `captured_at` first.
    async fn find_by_owner(&self, owner: Option<&str>) -> StoreResult<Vec<Sighting>>;

    async fn find_by_id(&self, id: &SightingId) -> StoreResult<Sighting>;

    /// Apply a partial update and return the updated record.
    async fn update_by_id(&self, id: &SightingId, patch: SightingPatch) -> StoreResult<Sighting>;

    /// Remove a record and return what was removed.
    async fn delete_by_id(&self, id: &SightingId) -> StoreResult<Sighting>;
}

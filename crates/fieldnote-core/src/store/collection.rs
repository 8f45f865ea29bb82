//! The record map shared by both store implementations.

use std::collections::HashMap;

use crate::error::{StoreError, StoreResult};
use crate::types::{NewSighting, Sighting, SightingId, SightingPatch};

#[derive(Debug, Clone, Default)]
pub(super) struct Collection {
    records: HashMap<SightingId, Sighting>,
}

impl Collection {
    pub(super) fn from_records(records: Vec<Sighting>) -> Self {
        Self {
            records: records.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    /// All records in `captured_at` order, ties broken by id.
    pub(super) fn to_sorted(&self) -> Vec<Sighting> {
        let mut all: Vec<Sighting> = self.records.values().cloned().collect();
        sort(&mut all);
        all
    }

    pub(super) fn create(&mut self, new: NewSighting) -> Sighting {
        let mut id = SightingId::new();
        while self.records.contains_key(&id) {
            id = SightingId::new();
        }
        let sighting = Sighting {
            id,
            owner: new.owner,
            captured_at: new.captured_at,
            category: new.text.category,
            title: new.text.title,
            details: new.text.details,
            coordinates: new.coordinates,
            artifacts: new.artifacts,
        };
        self.records.insert(id, sighting.clone());
        sighting
    }

    pub(super) fn find_by_owner(&self, owner: Option<&str>) -> Vec<Sighting> {
        let mut found: Vec<Sighting> = self
            .records
            .values()
            .filter(|s| s.owner.as_deref() == owner)
            .cloned()
            .collect();
        sort(&mut found);
        found
    }

    pub(super) fn find_by_id(&self, id: &SightingId) -> StoreResult<Sighting> {
        self.records
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    pub(super) fn update(&mut self, id: &SightingId, patch: SightingPatch) -> StoreResult<Sighting> {
        let sighting = self.records.get_mut(id).ok_or(StoreError::NotFound(*id))?;
        patch.apply(sighting);
        Ok(sighting.clone())
    }

    pub(super) fn delete(&mut self, id: &SightingId) -> StoreResult<Sighting> {
        self.records.remove(id).ok_or(StoreError::NotFound(*id))
    }

    pub(super) fn len(&self) -> usize {
        self.records.len()
    }
}

fn sort(sightings: &mut [Sighting]) {
    sightings.sort_by(|a, b| a.captured_at.cmp(&b.captured_at).then(a.id.cmp(&b.id)));
}

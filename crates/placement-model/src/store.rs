//! The placement store: one record per image slot.
//!
//! A document has exactly one store. The editor mutates it and the export
//! pass reads it; neither keeps its own copy of placement state.

use std::collections::BTreeMap;

use crate::record::PlacementRecord;

/// Keyed map from slot identifier to placement record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementStore {
    records: BTreeMap<String, PlacementRecord>,
}

impl PlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `slot_id`, or the identity record if the slot is unknown.
    pub fn get(&self, slot_id: &str) -> PlacementRecord {
        self.records.get(slot_id).copied().unwrap_or_default()
    }

    /// Whether a record has been created for `slot_id`.
    pub fn contains(&self, slot_id: &str) -> bool {
        self.records.contains_key(slot_id)
    }

    /// Store a record after clamping it. Returns the stored value.
    pub fn set(&mut self, slot_id: impl Into<String>, record: PlacementRecord) -> PlacementRecord {
        let record = record.clamped();
        self.records.insert(slot_id.into(), record);
        record
    }

    /// Create the default record for a slot the first time it appears.
    pub fn ensure(&mut self, slot_id: impl Into<String>) -> PlacementRecord {
        *self.records.entry(slot_id.into()).or_default()
    }

    /// The slot's image source changed, optionally resetting its placement.
    pub fn replace_image(&mut self, slot_id: impl Into<String>, reset: bool) -> PlacementRecord {
        let slot_id = slot_id.into();
        if reset {
            self.set(slot_id, PlacementRecord::IDENTITY)
        } else {
            self.ensure(slot_id)
        }
    }

    /// Drop a slot's record. Returns the removed record, if any.
    pub fn remove(&mut self, slot_id: &str) -> Option<PlacementRecord> {
        self.records.remove(slot_id)
    }

    /// Reset every known slot to the identity record.
    pub fn reset_all(&mut self) {
        for record in self.records.values_mut() {
            *record = PlacementRecord::IDENTITY;
        }
    }

    /// Slots in stable (sorted) key order.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &PlacementRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

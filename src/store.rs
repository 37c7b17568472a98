//! Bounded, insertion-ordered store of geofence records.
//!
//! Geofences are a shared system resource: mobile platforms cap an app at 20
//! simultaneously registered regions, so the store enforces that ceiling at
//! `add` time rather than letting the platform reject the 21st registration.
//! Lookups are linear scans; at ≤ 20 entries nothing faster is warranted.

use crate::error::{FenceError, Result};
use crate::GeofenceRecord;

/// Maximum number of simultaneously registered geofences per app.
pub const MAX_MONITORED_REGIONS: usize = 20;

/// Insertion-ordered record store with a hard capacity ceiling.
///
/// Order is display-relevant (the host lists fences in creation order) but
/// carries no other meaning.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<GeofenceRecord>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Build a store from already-validated records, e.g. a persistence load.
    ///
    /// Records past the capacity ceiling are dropped with a warning; a
    /// durable store should never contain more than the ceiling, but a load
    /// must not produce a store that violates the invariant.
    pub fn from_records(records: Vec<GeofenceRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            if let Err(e) = store.add(record) {
                log::warn!("[Store] Dropping record on load: {}", e);
            }
        }
        store
    }

    /// Append a record, preserving insertion order.
    ///
    /// Fails with `CapacityExceeded` when the store is full and
    /// `DuplicateIdentifier` when the identifier is already present; the
    /// store is unchanged in both cases.
    pub fn add(&mut self, record: GeofenceRecord) -> Result<()> {
        if self.records.len() >= MAX_MONITORED_REGIONS {
            return Err(FenceError::CapacityExceeded {
                capacity: MAX_MONITORED_REGIONS,
            });
        }
        if self.find(&record.identifier).is_some() {
            return Err(FenceError::DuplicateIdentifier {
                identifier: record.identifier.clone(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Remove the record with this identifier, returning it.
    ///
    /// Signals `NotFound` rather than silently succeeding so the caller can
    /// decide whether to also skip deregistration.
    pub fn remove(&mut self, identifier: &str) -> Result<GeofenceRecord> {
        match self.records.iter().position(|r| r.identifier == identifier) {
            Some(index) => Ok(self.records.remove(index)),
            None => Err(FenceError::not_found(identifier)),
        }
    }

    /// Look up a record by identifier.
    pub fn find(&self, identifier: &str) -> Option<&GeofenceRecord> {
        self.records.iter().find(|r| r.identifier == identifier)
    }

    /// Number of stored records (drives the host's fence counter).
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Whether another record can still be added.
    pub fn is_full(&self) -> bool {
        self.records.len() >= MAX_MONITORED_REGIONS
    }

    /// Snapshot of all records in insertion order (not a live view).
    pub fn all(&self) -> Vec<GeofenceRecord> {
        self.records.clone()
    }

    /// Iterate over stored records without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &GeofenceRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeoPoint, TriggerType};

    fn sample_record(note: &str) -> GeofenceRecord {
        GeofenceRecord::new(GeoPoint::new(51.5074, -0.1278), 150.0, note, TriggerType::OnEntry)
    }

    #[test]
    fn test_add_then_find_round_trips() {
        let mut store = RecordStore::new();
        let record = sample_record("Pick up kids");
        let id = record.identifier.clone();
        store.add(record.clone()).unwrap();

        assert_eq!(store.find(&id), Some(&record));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_capacity_ceiling() {
        let mut store = RecordStore::new();
        for i in 0..MAX_MONITORED_REGIONS {
            store.add(sample_record(&format!("fence {}", i))).unwrap();
        }
        assert!(store.is_full());

        let result = store.add(sample_record("one too many"));
        assert_eq!(
            result,
            Err(FenceError::CapacityExceeded {
                capacity: MAX_MONITORED_REGIONS
            })
        );
        // Store unchanged by the failed add
        assert_eq!(store.count(), MAX_MONITORED_REGIONS);
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut store = RecordStore::new();
        let record = sample_record("first");
        store.add(record.clone()).unwrap();

        let result = store.add(record);
        assert!(matches!(result, Err(FenceError::DuplicateIdentifier { .. })));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_remove_then_find_is_absent() {
        let mut store = RecordStore::new();
        let record = sample_record("temp");
        let id = record.identifier.clone();
        store.add(record).unwrap();

        let removed = store.remove(&id).unwrap();
        assert_eq!(removed.identifier, id);
        assert!(store.find(&id).is_none());
    }

    #[test]
    fn test_remove_missing_signals_not_found() {
        let mut store = RecordStore::new();
        let result = store.remove("no-such-id");
        assert_eq!(result, Err(FenceError::not_found("no-such-id")));
    }

    #[test]
    fn test_all_preserves_insertion_order() {
        let mut store = RecordStore::new();
        let first = sample_record("first");
        let second = sample_record("second");
        store.add(first.clone()).unwrap();
        store.add(second.clone()).unwrap();

        let all = store.all();
        assert_eq!(all, vec![first, second]);
    }

    #[test]
    fn test_from_records_drops_overflow() {
        let records: Vec<_> = (0..MAX_MONITORED_REGIONS + 3)
            .map(|i| sample_record(&format!("fence {}", i)))
            .collect();
        let store = RecordStore::from_records(records);
        assert_eq!(store.count(), MAX_MONITORED_REGIONS);
    }
}

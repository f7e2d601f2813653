//! In-memory record store for testing.

use crate::error::StorageResult;
use crate::store::{RecordKey, RecordStore, RecordWrite};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory record store.
///
/// This store keeps all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral object graphs that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads. A batch is
/// applied under a single write lock, so readers never see half a batch.
///
/// # Example
///
/// ```rust
/// use relata_storage::{InMemoryRecordStore, RecordKey, RecordStore, RecordWrite};
///
/// let store = InMemoryRecordStore::new();
/// store.apply(&[RecordWrite::put(RecordKey::new("Order", [1; 16]), vec![1])]).unwrap();
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<RecordKey, Vec<u8>>>,
}

impl InMemoryRecordStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-existing records.
    ///
    /// Useful for seeding test fixtures.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = (RecordKey, Vec<u8>)>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
        }
    }

    /// Returns a copy of all records.
    #[must_use]
    pub fn records(&self) -> BTreeMap<RecordKey, Vec<u8>> {
        self.records.read().clone()
    }

    /// Removes all records.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, key: &RecordKey) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn scan(&self, class_id: &str) -> StorageResult<Vec<(RecordKey, Vec<u8>)>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|(key, _)| key.class_id == class_id)
            .map(|(key, payload)| (key.clone(), payload.clone()))
            .collect())
    }

    fn apply(&self, batch: &[RecordWrite]) -> StorageResult<()> {
        let mut records = self.records.write();
        apply_to_map(&mut records, batch);
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }
}

/// Applies a batch to an ordered map.
pub(crate) fn apply_to_map(records: &mut BTreeMap<RecordKey, Vec<u8>>, batch: &[RecordWrite]) {
    for write in batch {
        match write {
            RecordWrite::Put { key, payload } => {
                records.insert(key.clone(), payload.clone());
            }
            RecordWrite::Delete { key } => {
                records.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(class: &str, byte: u8) -> RecordKey {
        RecordKey::new(class, [byte; 16])
    }

    #[test]
    fn new_store_is_empty() {
        let store = InMemoryRecordStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(&key("A", 1)).unwrap(), None);
    }

    #[test]
    fn apply_put_and_get() {
        let store = InMemoryRecordStore::new();
        store
            .apply(&[RecordWrite::put(key("A", 1), b"one".to_vec())])
            .unwrap();
        assert_eq!(store.get(&key("A", 1)).unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn later_write_in_batch_wins() {
        let store = InMemoryRecordStore::new();
        store
            .apply(&[
                RecordWrite::put(key("A", 1), b"one".to_vec()),
                RecordWrite::put(key("A", 1), b"two".to_vec()),
            ])
            .unwrap();
        assert_eq!(store.get(&key("A", 1)).unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn delete_missing_is_noop() {
        let store = InMemoryRecordStore::new();
        store.apply(&[RecordWrite::delete(key("A", 1))]).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn scan_filters_by_class() {
        let store = InMemoryRecordStore::with_records(vec![
            (key("A", 2), vec![2]),
            (key("B", 1), vec![9]),
            (key("A", 1), vec![1]),
        ]);
        let scanned = store.scan("A").unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].1, vec![1]);
        assert_eq!(scanned[1].1, vec![2]);
    }

    #[test]
    fn clear_removes_everything() {
        let store = InMemoryRecordStore::with_records(vec![(key("A", 1), vec![1])]);
        store.clear();
        assert!(store.is_empty());
    }
}

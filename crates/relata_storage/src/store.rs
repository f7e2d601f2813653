//! Record store trait definition.

use crate::error::StorageResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a stored record.
///
/// Records are grouped by class id; the object key is the 16 raw bytes of
/// the object's UUID.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Class the record belongs to.
    pub class_id: String,
    /// Raw object key.
    pub object_key: [u8; 16],
}

impl RecordKey {
    /// Creates a record key.
    pub fn new(class_id: impl Into<String>, object_key: [u8; 16]) -> Self {
        Self {
            class_id: class_id.into(),
            object_key,
        }
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordKey({}|", self.class_id)?;
        for byte in &self.object_key {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// A single write inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordWrite {
    /// Insert or replace a record.
    Put {
        /// Record key.
        key: RecordKey,
        /// Opaque payload.
        payload: Vec<u8>,
    },
    /// Remove a record. Removing a missing record is not an error.
    Delete {
        /// Record key.
        key: RecordKey,
    },
}

impl RecordWrite {
    /// Creates a put write.
    pub fn put(key: RecordKey, payload: Vec<u8>) -> Self {
        Self::Put { key, payload }
    }

    /// Creates a delete write.
    pub fn delete(key: RecordKey) -> Self {
        Self::Delete { key }
    }

    /// Returns the key this write targets.
    pub fn key(&self) -> &RecordKey {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// A keyed record store.
///
/// # Invariants
///
/// - `apply` is atomic: after an error no write of the batch is visible
/// - `get` after a successful `apply` observes the batch
/// - `scan` returns records of one class ordered by key
pub trait RecordStore: Send + Sync {
    /// Reads a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, key: &RecordKey) -> StorageResult<Option<Vec<u8>>>;

    /// Returns every record of a class, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn scan(&self, class_id: &str) -> StorageResult<Vec<(RecordKey, Vec<u8>)>>;

    /// Applies a batch of writes atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be made durable; in that case
    /// none of its writes are visible.
    fn apply(&self, batch: &[RecordWrite]) -> StorageResult<()>;

    /// Returns the number of stored records.
    fn len(&self) -> usize;

    /// Returns true if the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn get(&self, key: &RecordKey) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn scan(&self, class_id: &str) -> StorageResult<Vec<(RecordKey, Vec<u8>)>> {
        (**self).scan(class_id)
    }

    fn apply(&self, batch: &[RecordWrite]) -> StorageResult<()> {
        (**self).apply(batch)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

//! Record stores with injected failures.

use parking_lot::Mutex;
use relata_storage::{
    InMemoryRecordStore, RecordKey, RecordStore, RecordWrite, StorageError, StorageResult,
};

/// An in-memory store whose writes can be made to fail.
///
/// Reads always succeed. A failing `apply` writes nothing.
#[derive(Debug, Default)]
pub struct FailingRecordStore {
    inner: InMemoryRecordStore,
    failures: Mutex<Failures>,
}

#[derive(Debug, Default)]
struct Failures {
    fail_next: usize,
    fail_all: bool,
    attempts: usize,
}

impl FailingRecordStore {
    /// Creates an empty store that accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls to `apply` fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.failures.lock().fail_next = count;
    }

    /// Makes every later call to `apply` fail until [`heal`](Self::heal) is called.
    pub fn fail_all_writes(&self) {
        self.failures.lock().fail_all = true;
    }

    /// Accepts writes again.
    pub fn heal(&self) {
        let mut failures = self.failures.lock();
        failures.fail_next = 0;
        failures.fail_all = false;
    }

    /// Number of `apply` calls, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.failures.lock().attempts
    }
}

impl RecordStore for FailingRecordStore {
    fn get(&self, key: &RecordKey) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn scan(&self, class_id: &str) -> StorageResult<Vec<(RecordKey, Vec<u8>)>> {
        self.inner.scan(class_id)
    }

    fn apply(&self, batch: &[RecordWrite]) -> StorageResult<()> {
        {
            let mut failures = self.failures.lock();
            failures.attempts += 1;
            if failures.fail_all {
                return Err(StorageError::rejected("store is failing every write"));
            }
            if failures.fail_next > 0 {
                failures.fail_next -= 1;
                return Err(StorageError::rejected("injected write failure"));
            }
        }
        self.inner.apply(batch)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

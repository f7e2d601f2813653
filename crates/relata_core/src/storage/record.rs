//! Storage provider over a [`RecordStore`].

use crate::data::{DataContainer, PersistableData};
use crate::error::{CoreError, CoreResult};
use crate::mapping::{MappingConfiguration, RelationEndPointDefinition};
use crate::object::{ObjectId, Value};
use crate::query::{CustomQuery, Query, QueryRow};
use crate::storage::StorageProvider;
use crate::types::ObjectState;
use parking_lot::Mutex;
use relata_storage::{RecordKey, RecordStore, RecordWrite};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Stored form of one domain object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Incremented on every write of the object.
    pub timestamp: u64,
    /// Property values, foreign keys included.
    pub values: BTreeMap<String, Value>,
}

impl StoredRecord {
    /// Creates a record.
    pub fn new(timestamp: u64, values: BTreeMap<String, Value>) -> Self {
        Self { timestamp, values }
    }

    /// Encodes the record to CBOR bytes.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).map_err(|e| CoreError::codec(e.to_string()))?;
        Ok(bytes)
    }

    /// Decodes a record from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::codec(e.to_string()))
    }
}

/// Record key of an object.
pub(crate) fn record_key(id: &ObjectId) -> RecordKey {
    RecordKey::new(id.class_id(), *id.as_bytes())
}

/// [`StorageProvider`] that stores each object as a CBOR [`StoredRecord`].
///
/// Writes are checked against the stored timestamps under a commit lock:
/// persisting an object that another transaction changed, deleted or created
/// in the meantime fails with [`CoreError::ConcurrencyViolation`] and writes
/// nothing.
pub struct RecordStorageProvider<S: RecordStore> {
    store: S,
    mapping: Arc<MappingConfiguration>,
    commit_lock: Mutex<()>,
}

impl<S: RecordStore> RecordStorageProvider<S> {
    /// Creates a provider.
    pub fn new(store: S, mapping: Arc<MappingConfiguration>) -> Self {
        Self {
            store,
            mapping,
            commit_lock: Mutex::new(()),
        }
    }

    /// Returns the underlying record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the mapping.
    pub fn mapping(&self) -> &Arc<MappingConfiguration> {
        &self.mapping
    }

    fn to_container(&self, key: RecordKey, record: StoredRecord) -> CoreResult<DataContainer> {
        let class = self.mapping.class(&key.class_id)?;
        let mut stored = record.values;
        let values = class
            .properties()
            .iter()
            .map(|p| {
                let value = stored.remove(p.name()).unwrap_or(Value::Null);
                (p.name().to_string(), value)
            })
            .collect();
        let id = ObjectId::from_bytes(key.class_id, key.object_key);
        Ok(DataContainer::existing(id, record.timestamp, values))
    }

    fn scan_class(&self, class_id: &str) -> CoreResult<Vec<(RecordKey, StoredRecord)>> {
        self.mapping.class(class_id)?;
        self.store
            .scan(class_id)?
            .into_iter()
            .map(|(key, bytes)| Ok((key, StoredRecord::decode(&bytes)?)))
            .collect()
    }

    fn matching_records(&self, query: &Query) -> CoreResult<Vec<(RecordKey, StoredRecord)>> {
        let mut records: Vec<_> = self
            .scan_class(query.class_id())?
            .into_iter()
            .filter(|(_, record)| query.matches(&record.values))
            .collect();
        records.sort_by(|(_, a), (_, b)| query.compare(&a.values, &b.values));
        if let Some(limit) = query.max_results() {
            records.truncate(limit);
        }
        Ok(records)
    }

    fn stored_timestamp(&self, key: &RecordKey) -> CoreResult<Option<u64>> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(StoredRecord::decode(&bytes)?.timestamp)),
            None => Ok(None),
        }
    }
}

impl<S: RecordStore> StorageProvider for RecordStorageProvider<S> {
    fn load(&self, id: &ObjectId) -> CoreResult<Option<DataContainer>> {
        let key = record_key(id);
        match self.store.get(&key)? {
            Some(bytes) => {
                let record = StoredRecord::decode(&bytes)?;
                Ok(Some(self.to_container(key, record)?))
            }
            None => Ok(None),
        }
    }

    fn load_related(
        &self,
        end_point: &RelationEndPointDefinition,
        related: &ObjectId,
    ) -> CoreResult<Vec<DataContainer>> {
        let expected = Value::Reference(related.clone());
        self.scan_class(end_point.class_id())?
            .into_iter()
            .filter(|(_, record)| record.values.get(end_point.property_name()) == Some(&expected))
            .map(|(key, record)| self.to_container(key, record))
            .collect()
    }

    fn query(&self, query: &Query) -> CoreResult<Vec<DataContainer>> {
        self.matching_records(query)?
            .into_iter()
            .map(|(key, record)| self.to_container(key, record))
            .collect()
    }

    fn custom_query(&self, query: &CustomQuery) -> CoreResult<Vec<QueryRow>> {
        let class = self.mapping.class(query.query().class_id())?;
        let columns: Vec<String> = if query.columns().is_empty() {
            class.properties().iter().map(|p| p.name().to_string()).collect()
        } else {
            query.columns().to_vec()
        };
        Ok(self
            .matching_records(query.query())?
            .into_iter()
            .map(|(_, mut record)| {
                let values = columns
                    .iter()
                    .map(|c| (c.clone(), record.values.remove(c).unwrap_or(Value::Null)))
                    .collect();
                QueryRow::new(values)
            })
            .collect())
    }

    fn persist(&self, data: &[PersistableData]) -> CoreResult<()> {
        let _guard = self.commit_lock.lock();
        let mut batch = Vec::with_capacity(data.len());
        for item in data {
            let container = item.container();
            let key = record_key(item.id());
            let stored = self.stored_timestamp(&key)?;
            match item.state() {
                ObjectState::New => {
                    if stored.is_some() {
                        return Err(CoreError::concurrency_violation(item.id()));
                    }
                    let record = StoredRecord::new(1, container.current_values());
                    batch.push(RecordWrite::put(key, record.encode()?));
                }
                ObjectState::Changed => {
                    let loaded = container.timestamp();
                    if stored.is_none() || stored != loaded {
                        return Err(CoreError::concurrency_violation(item.id()));
                    }
                    let record =
                        StoredRecord::new(loaded.unwrap_or(0) + 1, container.current_values());
                    batch.push(RecordWrite::put(key, record.encode()?));
                }
                ObjectState::Deleted => {
                    if container.is_created_in_transaction() {
                        continue;
                    }
                    if stored.is_none() || stored != container.timestamp() {
                        return Err(CoreError::concurrency_violation(item.id()));
                    }
                    batch.push(RecordWrite::delete(key));
                }
                state => {
                    return Err(CoreError::invalid_operation(format!(
                        "object '{}' in state {state} cannot be persisted",
                        item.id()
                    )));
                }
            }
        }
        if batch.is_empty() {
            return Ok(());
        }
        self.store.apply(&batch)?;
        tracing::debug!(writes = batch.len(), "persisted commit batch");
        Ok(())
    }
}

impl<S: RecordStore> fmt::Debug for RecordStorageProvider<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStorageProvider")
            .field("records", &self.store.len())
            .finish_non_exhaustive()
    }
}

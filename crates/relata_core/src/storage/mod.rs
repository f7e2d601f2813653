//! Storage collaborator of root client transactions.

mod record;

pub use record::{RecordStorageProvider, StoredRecord};

use crate::data::{DataContainer, PersistableData};
use crate::error::CoreResult;
use crate::mapping::RelationEndPointDefinition;
use crate::object::ObjectId;
use crate::query::{CustomQuery, Query, QueryRow};

/// Loads and persists domain object data.
pub trait StorageProvider: Send + Sync {
    /// Loads one object; `Ok(None)` if it does not exist.
    fn load(&self, id: &ObjectId) -> CoreResult<Option<DataContainer>>;

    /// Loads every object whose foreign-key end-point refers to `related`.
    fn load_related(
        &self,
        end_point: &RelationEndPointDefinition,
        related: &ObjectId,
    ) -> CoreResult<Vec<DataContainer>>;

    /// Executes an object query.
    fn query(&self, query: &Query) -> CoreResult<Vec<DataContainer>>;

    /// Executes a projection.
    fn custom_query(&self, query: &CustomQuery) -> CoreResult<Vec<QueryRow>>;

    /// Writes the changed objects atomically.
    fn persist(&self, data: &[PersistableData]) -> CoreResult<()>;
}

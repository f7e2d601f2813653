//! Where a transaction loads its objects from and commits them to.

use crate::data::{DataContainer, PersistableData};
use crate::error::CoreResult;
use crate::mapping::RelationEndPointDefinition;
use crate::object::ObjectId;
use crate::query::{CustomQuery, Query, QueryRow};
use crate::storage::StorageProvider;
use crate::transaction::ClientTransaction;
use std::sync::Arc;

/// Result of loading a single object.
pub(crate) enum SourceObject {
    Found(DataContainer),
    NotFound,
    /// Deleted or discarded in the parent transaction.
    Invalid,
}

pub(crate) enum DataSource {
    Storage(Arc<dyn StorageProvider>),
    Parent(Box<ClientTransaction>),
}

impl DataSource {
    pub(crate) fn parent(&self) -> Option<&ClientTransaction> {
        match self {
            DataSource::Storage(_) => None,
            DataSource::Parent(parent) => Some(&**parent),
        }
    }

    pub(crate) fn is_storage(&self) -> bool {
        matches!(self, DataSource::Storage(_))
    }

    pub(crate) fn load(&mut self, id: &ObjectId) -> CoreResult<SourceObject> {
        match self {
            DataSource::Storage(storage) => Ok(storage
                .load(id)?
                .map_or(SourceObject::NotFound, SourceObject::Found)),
            DataSource::Parent(parent) => parent.load_for_child(id),
        }
    }

    /// Loads the objects on the foreign-key side of a virtual end-point of `owner`.
    pub(crate) fn load_related(
        &mut self,
        virtual_end_point: &RelationEndPointDefinition,
        foreign_key_end_point: &RelationEndPointDefinition,
        owner: &ObjectId,
    ) -> CoreResult<Vec<DataContainer>> {
        match self {
            DataSource::Storage(storage) => storage.load_related(foreign_key_end_point, owner),
            DataSource::Parent(parent) => parent.load_related_for_child(virtual_end_point, owner),
        }
    }

    pub(crate) fn query(&mut self, query: &Query) -> CoreResult<Vec<DataContainer>> {
        match self {
            DataSource::Storage(storage) => storage.query(query),
            DataSource::Parent(parent) => parent.query_for_child(query),
        }
    }

    pub(crate) fn custom_query(&mut self, query: &CustomQuery) -> CoreResult<Vec<QueryRow>> {
        match self {
            DataSource::Storage(storage) => storage.custom_query(query),
            DataSource::Parent(parent) => parent.execute_custom_query(query),
        }
    }

    pub(crate) fn persist(&mut self, data: &[PersistableData]) -> CoreResult<()> {
        match self {
            DataSource::Storage(storage) => storage.persist(data),
            DataSource::Parent(parent) => parent.receive_sub_commit(data),
        }
    }
}

//! Sub-transactions.
//!
//! A sub-transaction takes ownership of its parent, loads through it and
//! commits into it. The parent becomes usable again when the sub-transaction
//! is discarded.

use crate::data::{ContainerState, DataContainer, EndPointData, PersistableData};
use crate::error::{CoreError, CoreResult};
use crate::mapping::RelationEndPointDefinition;
use crate::object::ObjectId;
use crate::query::Query;
use crate::transaction::source::{DataSource, SourceObject};
use crate::transaction::ClientTransaction;
use crate::types::{ObjectState, ValueAccess};
use std::fmt;
use std::sync::Arc;

/// A sub-transaction could not be created; the parent is handed back unchanged.
pub struct SubTransactionRejected {
    /// Why the sub-transaction was rejected.
    pub error: CoreError,
    /// The transaction that tried to create the sub-transaction.
    pub parent: ClientTransaction,
}

impl fmt::Debug for SubTransactionRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubTransactionRejected")
            .field("error", &self.error)
            .field("parent", &self.parent.id())
            .finish()
    }
}

impl fmt::Display for SubTransactionRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-transaction rejected: {}", self.error)
    }
}

impl std::error::Error for SubTransactionRejected {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<SubTransactionRejected> for CoreError {
    fn from(rejected: SubTransactionRejected) -> Self {
        rejected.error
    }
}

impl ClientTransaction {
    /// Creates a sub-transaction with this transaction as parent.
    ///
    /// The sub-transaction inherits the configuration, validators and
    /// extensions. Objects deleted or invalid in the parent are invalid in
    /// the sub-transaction.
    pub fn create_sub_transaction(self) -> Result<ClientTransaction, SubTransactionRejected> {
        if self.depth >= self.config.max_sub_transaction_depth {
            let error = CoreError::invalid_operation(format!(
                "maximum sub-transaction depth of {} reached",
                self.config.max_sub_transaction_depth
            ));
            return Err(SubTransactionRejected {
                error,
                parent: self,
            });
        }
        let creating = self.notify_before(|extension, tx| extension.sub_transaction_creating(tx));
        if let Err(error) = creating {
            return Err(SubTransactionRejected {
                error,
                parent: self,
            });
        }

        let mapping = Arc::clone(&self.mapping);
        let config = self.config.clone();
        let extensions = self.extensions.clone();
        let validator = self.validator.clone();
        let depth = self.depth + 1;
        let parent_id = self.id;
        let child = ClientTransaction::with_source(
            mapping,
            DataSource::Parent(Box::new(self)),
            config,
            extensions,
            Some(validator),
            depth,
        );
        tracing::debug!(parent = %parent_id, transaction = %child.id, depth, "sub-transaction created");

        child.notify(|extension, tx| extension.sub_transaction_initialize(tx));
        if let Some(parent) = child.parent() {
            parent.notify(|extension, tx| extension.sub_transaction_created(tx, &child));
        }
        Ok(child)
    }

    /// Discards the transaction, returning the parent of a sub-transaction.
    ///
    /// Uncommitted changes of a sub-transaction are dropped.
    pub fn discard(self) -> Option<ClientTransaction> {
        self.notify(|extension, tx| extension.transaction_discard(tx));
        tracing::debug!(transaction = %self.id, "client transaction discarded");
        match self.source {
            DataSource::Parent(parent) => Some(*parent),
            DataSource::Storage(_) => None,
        }
    }

    pub(crate) fn load_for_child(&mut self, id: &ObjectId) -> CoreResult<SourceObject> {
        if self.data.is_invalid(id) {
            return Ok(SourceObject::Invalid);
        }
        let Some(container) = self.try_get_object(id)? else {
            return Ok(SourceObject::NotFound);
        };
        if container.state() == ContainerState::Deleted {
            return Ok(SourceObject::Invalid);
        }
        Ok(SourceObject::Found(container.to_child_copy()))
    }

    pub(crate) fn load_related_for_child(
        &mut self,
        definition: &RelationEndPointDefinition,
        owner: &ObjectId,
    ) -> CoreResult<Vec<DataContainer>> {
        if self.data.is_invalid(owner) {
            return Ok(Vec::new());
        }
        let related = if definition.is_collection() {
            self.related_objects(owner, definition, ValueAccess::Current)?
        } else {
            self.related_object(owner, definition, ValueAccess::Current)?
                .into_iter()
                .collect()
        };
        Ok(self.child_copies(&related))
    }

    pub(crate) fn query_for_child(&mut self, query: &Query) -> CoreResult<Vec<DataContainer>> {
        let ids = self.execute_query(query)?;
        Ok(self.child_copies(&ids))
    }

    fn child_copies(&self, ids: &[ObjectId]) -> Vec<DataContainer> {
        ids.iter()
            .filter(|id| self.data.state(id) != ObjectState::Deleted)
            .filter_map(|id| self.data.container(id))
            .map(DataContainer::to_child_copy)
            .collect()
    }

    /// Takes over the changes committed by a sub-transaction.
    pub(crate) fn receive_sub_commit(&mut self, data: &[PersistableData]) -> CoreResult<()> {
        let snapshot = self.data.clone();
        let result = self.apply_sub_commit(data);
        if result.is_err() {
            self.data = snapshot;
        }
        result
    }

    fn apply_sub_commit(&mut self, data: &[PersistableData]) -> CoreResult<()> {
        let mapping = Arc::clone(&self.mapping);

        // New objects first, so that references between them resolve.
        for item in data.iter().filter(|d| d.state() == ObjectState::New) {
            let class = mapping.class(item.id().class_id())?;
            self.data
                .register(DataContainer::new_object(item.id().clone(), class));
            for end_point in class.virtual_end_points() {
                self.data.insert_end_point(
                    item.id(),
                    end_point.property_name(),
                    EndPointData::empty(end_point.is_collection()),
                );
            }
        }

        for item in data {
            let id = item.id();
            match item.state() {
                ObjectState::New | ObjectState::Changed => {
                    self.ensure_loaded(id)?;
                    if let Some(container) = self.data.container_mut(id) {
                        for (name, value) in item.container().values() {
                            container.set_value(name, value.current().clone());
                        }
                    }
                    let class = mapping.class(id.class_id())?;
                    for end_point in class.virtual_end_points() {
                        if let Some(value) = item.end_point(end_point.property_name()) {
                            self.ensure_end_point_loaded(id, end_point)?;
                            if let Some(data) = self.data.end_point_mut(id, end_point.property_name()) {
                                data.replace_current(value.clone());
                            }
                        }
                    }
                }
                ObjectState::Deleted => match self.data.state(id) {
                    ObjectState::New => self.data.invalidate(id),
                    ObjectState::Unchanged | ObjectState::Changed => {
                        if let Some(container) = self.data.container_mut(id) {
                            container.mark_deleted();
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        tracing::debug!(transaction = %self.id, objects = data.len(), "sub-transaction changes received");
        Ok(())
    }
}

//! Client transaction extensions.
//!
//! An extension observes every lifecycle point of a [`ClientTransaction`].
//! All hooks have empty default bodies, so an implementation overrides only
//! what it needs. Hooks named `*ing` run before the operation and can cancel
//! it by returning an error; nothing has changed at that point. Hooks named
//! `*ed` run after the operation and cannot fail.

mod collection;

pub use collection::ExtensionCollection;

use crate::data::PersistableData;
use crate::error::CoreResult;
use crate::object::{ObjectId, Value};
use crate::query::{CustomQuery, QueryResult, QueryRow};
use crate::transaction::ClientTransaction;
use crate::types::ValueAccess;

/// Observer of client transaction events.
///
/// ```rust,ignore
/// struct AuditLog;
///
/// impl ClientTransactionExtension for AuditLog {
///     fn key(&self) -> &str {
///         "audit"
///     }
///
///     fn committed(&self, _tx: &ClientTransaction, ids: &[ObjectId]) {
///         tracing::info!(count = ids.len(), "objects committed");
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait ClientTransactionExtension: Send + Sync {
    /// Unique key within a transaction's extension collection.
    fn key(&self) -> &str;

    /// The transaction was created.
    fn transaction_initialize(&self, tx: &ClientTransaction) {}

    /// The transaction is being discarded.
    fn transaction_discard(&self, tx: &ClientTransaction) {}

    /// A sub-transaction is about to be created.
    fn sub_transaction_creating(&self, tx: &ClientTransaction) -> CoreResult<()> {
        Ok(())
    }

    /// A sub-transaction was set up; called on the child before it is returned.
    fn sub_transaction_initialize(&self, child: &ClientTransaction) {}

    /// A sub-transaction was created.
    fn sub_transaction_created(&self, parent: &ClientTransaction, child: &ClientTransaction) {}

    /// A new object of the class is about to be created.
    fn new_object_creating(&self, tx: &ClientTransaction, class_id: &str) -> CoreResult<()> {
        Ok(())
    }

    /// Objects are about to be loaded, in load order.
    fn objects_loading(&self, tx: &ClientTransaction, ids: &[ObjectId]) -> CoreResult<()> {
        Ok(())
    }

    /// Objects were loaded and registered.
    fn objects_loaded(&self, tx: &ClientTransaction, ids: &[ObjectId]) {}

    /// Objects are about to be unloaded.
    fn objects_unloading(&self, tx: &ClientTransaction, ids: &[ObjectId]) -> CoreResult<()> {
        Ok(())
    }

    /// Objects were unloaded.
    fn objects_unloaded(&self, tx: &ClientTransaction, ids: &[ObjectId]) {}

    /// An object is about to be marked deleted.
    fn object_deleting(&self, tx: &ClientTransaction, id: &ObjectId) -> CoreResult<()> {
        Ok(())
    }

    /// An object was marked deleted.
    fn object_deleted(&self, tx: &ClientTransaction, id: &ObjectId) {}

    /// A property value is about to be read.
    fn property_value_reading(
        &self,
        tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        access: ValueAccess,
    ) -> CoreResult<()> {
        Ok(())
    }

    /// A property value was read.
    fn property_value_read(
        &self,
        tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        value: &Value,
        access: ValueAccess,
    ) {
    }

    /// A property value is about to change.
    fn property_value_changing(
        &self,
        tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        old_value: &Value,
        new_value: &Value,
    ) -> CoreResult<()> {
        Ok(())
    }

    /// A property value changed.
    fn property_value_changed(
        &self,
        tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        old_value: &Value,
        new_value: &Value,
    ) {
    }

    /// A relation end-point is about to be read.
    fn relation_reading(
        &self,
        tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        access: ValueAccess,
    ) -> CoreResult<()> {
        Ok(())
    }

    /// A single-valued relation end-point was read.
    fn relation_read_object(
        &self,
        tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        related: Option<&ObjectId>,
        access: ValueAccess,
    ) {
    }

    /// A collection end-point was read.
    fn relation_read_collection(
        &self,
        tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        related: &[ObjectId],
        access: ValueAccess,
    ) {
    }

    /// One end-point of a relation is about to change.
    ///
    /// Called once per affected end-point before any of them is modified.
    fn relation_changing(
        &self,
        tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        old_related: Option<&ObjectId>,
        new_related: Option<&ObjectId>,
    ) -> CoreResult<()> {
        Ok(())
    }

    /// One end-point of a relation changed.
    fn relation_changed(
        &self,
        tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        old_related: Option<&ObjectId>,
        new_related: Option<&ObjectId>,
    ) {
    }

    /// Filters the result of an object query.
    fn filter_query_result(&self, tx: &ClientTransaction, result: QueryResult) -> QueryResult {
        result
    }

    /// Filters the rows of a custom query.
    fn filter_custom_query_result(
        &self,
        tx: &ClientTransaction,
        query: &CustomQuery,
        rows: Vec<QueryRow>,
    ) -> Vec<QueryRow> {
        rows
    }

    /// The changed objects are about to be committed.
    ///
    /// The transaction may still be modified; the changed set is collected again afterwards.
    fn committing(&self, tx: &mut ClientTransaction, ids: &[ObjectId]) -> CoreResult<()> {
        Ok(())
    }

    /// Validates the frozen commit set after the built-in validators passed.
    fn commit_validate(&self, tx: &ClientTransaction, data: &[PersistableData]) -> CoreResult<()> {
        Ok(())
    }

    /// The objects were committed.
    fn committed(&self, tx: &ClientTransaction, ids: &[ObjectId]) {}

    /// The changed objects are about to be rolled back.
    fn rolling_back(&self, tx: &mut ClientTransaction, ids: &[ObjectId]) -> CoreResult<()> {
        Ok(())
    }

    /// The objects were rolled back.
    fn rolled_back(&self, tx: &ClientTransaction, ids: &[ObjectId]) {}
}

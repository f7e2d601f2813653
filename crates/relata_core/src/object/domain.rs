//! Typed domain object handles.

use crate::error::CoreResult;
use crate::object::{ObjectId, Value};
use crate::transaction::ClientTransaction;
use crate::types::ObjectState;

/// Trait for typed handles of mapped domain objects.
///
/// A handle is only an identity; all data lives in the
/// [`ClientTransaction`] passed to every operation, so the same handle can
/// be used with several transactions.
///
/// # Example
///
/// ```rust,ignore
/// use relata_core::{ClientTransaction, CoreResult, DomainObject, ObjectId};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Order(ObjectId);
///
/// impl DomainObject for Order {
///     const CLASS_ID: &'static str = "Order";
///
///     fn from_id(id: ObjectId) -> Self {
///         Order(id)
///     }
///
///     fn id(&self) -> &ObjectId {
///         &self.0
///     }
/// }
///
/// impl Order {
///     fn number(&self, tx: &mut ClientTransaction) -> CoreResult<i64> {
///         Ok(tx.get_value(self.id(), "OrderNumber")?.as_integer().unwrap_or_default())
///     }
/// }
///
/// let order: Order = tx.create()?;
/// ```
pub trait DomainObject: Sized {
    /// Mapped class id.
    const CLASS_ID: &'static str;

    /// Wraps an object ID of class [`Self::CLASS_ID`].
    fn from_id(id: ObjectId) -> Self;

    /// Returns the object ID.
    fn id(&self) -> &ObjectId;

    /// Returns the object's state in the given transaction.
    fn state(&self, tx: &ClientTransaction) -> ObjectState {
        tx.state(self.id())
    }

    /// Marks the object as deleted.
    fn delete(&self, tx: &mut ClientTransaction) -> CoreResult<()> {
        tx.delete(self.id())
    }

    /// Reads a property value.
    fn value(&self, tx: &mut ClientTransaction, property: &str) -> CoreResult<Value> {
        tx.get_value(self.id(), property)
    }

    /// Writes a property value.
    fn set_value(
        &self,
        tx: &mut ClientTransaction,
        property: &str,
        value: impl Into<Value>,
    ) -> CoreResult<()> {
        tx.set_value(self.id(), property, value)
    }

    /// Reads a single-valued relation as a typed handle.
    fn related<R: DomainObject>(
        &self,
        tx: &mut ClientTransaction,
        property: &str,
    ) -> CoreResult<Option<R>> {
        Ok(tx
            .get_related_object(self.id(), property)?
            .map(R::from_id))
    }

    /// Reads a collection-valued relation as typed handles.
    fn related_all<R: DomainObject>(
        &self,
        tx: &mut ClientTransaction,
        property: &str,
    ) -> CoreResult<Vec<R>> {
        Ok(tx
            .get_related_objects(self.id(), property)?
            .into_iter()
            .map(R::from_id)
            .collect())
    }
}

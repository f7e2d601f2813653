//! Extensions used by the test suite.

use parking_lot::Mutex;
use relata_core::{
    ClientTransaction, ClientTransactionExtension, CoreError, CoreResult, CustomQuery, ObjectId,
    PersistableData, QueryResult, QueryRow, Value, ValueAccess,
};

/// Records every notification it receives as a short event string.
///
/// Events name the hook, followed by the class and property involved or the
/// number of objects, e.g. `relation_changing Order.Customer` or
/// `committed 3`.
#[derive(Debug)]
pub struct RecordingExtension {
    key: String,
    events: Mutex<Vec<String>>,
}

impl RecordingExtension {
    /// Creates a recorder with the given key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Returns all events recorded so far.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Returns the events starting with `prefix`.
    pub fn events_matching(&self, prefix: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Forgets the recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }
}

fn member(id: &ObjectId, property: &str) -> String {
    format!("{}.{}", id.class_id(), property)
}

fn access_suffix(access: ValueAccess) -> &'static str {
    match access {
        ValueAccess::Current => "",
        ValueAccess::Original => " (original)",
    }
}

impl ClientTransactionExtension for RecordingExtension {
    fn key(&self) -> &str {
        &self.key
    }

    fn transaction_initialize(&self, _tx: &ClientTransaction) {
        self.record("transaction_initialize".into());
    }

    fn transaction_discard(&self, _tx: &ClientTransaction) {
        self.record("transaction_discard".into());
    }

    fn sub_transaction_creating(&self, _tx: &ClientTransaction) -> CoreResult<()> {
        self.record("sub_transaction_creating".into());
        Ok(())
    }

    fn sub_transaction_initialize(&self, child: &ClientTransaction) {
        self.record(format!("sub_transaction_initialize {}", child.depth()));
    }

    fn sub_transaction_created(&self, _parent: &ClientTransaction, child: &ClientTransaction) {
        self.record(format!("sub_transaction_created {}", child.depth()));
    }

    fn new_object_creating(&self, _tx: &ClientTransaction, class_id: &str) -> CoreResult<()> {
        self.record(format!("new_object_creating {class_id}"));
        Ok(())
    }

    fn objects_loading(&self, _tx: &ClientTransaction, ids: &[ObjectId]) -> CoreResult<()> {
        self.record(format!("objects_loading {}", ids.len()));
        Ok(())
    }

    fn objects_loaded(&self, _tx: &ClientTransaction, ids: &[ObjectId]) {
        self.record(format!("objects_loaded {}", ids.len()));
    }

    fn objects_unloading(&self, _tx: &ClientTransaction, ids: &[ObjectId]) -> CoreResult<()> {
        self.record(format!("objects_unloading {}", ids.len()));
        Ok(())
    }

    fn objects_unloaded(&self, _tx: &ClientTransaction, ids: &[ObjectId]) {
        self.record(format!("objects_unloaded {}", ids.len()));
    }

    fn object_deleting(&self, _tx: &ClientTransaction, id: &ObjectId) -> CoreResult<()> {
        self.record(format!("object_deleting {}", id.class_id()));
        Ok(())
    }

    fn object_deleted(&self, _tx: &ClientTransaction, id: &ObjectId) {
        self.record(format!("object_deleted {}", id.class_id()));
    }

    fn property_value_reading(
        &self,
        _tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        access: ValueAccess,
    ) -> CoreResult<()> {
        self.record(format!(
            "property_value_reading {}{}",
            member(id, property),
            access_suffix(access)
        ));
        Ok(())
    }

    fn property_value_read(
        &self,
        _tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        _value: &Value,
        access: ValueAccess,
    ) {
        self.record(format!(
            "property_value_read {}{}",
            member(id, property),
            access_suffix(access)
        ));
    }

    fn property_value_changing(
        &self,
        _tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        _old_value: &Value,
        _new_value: &Value,
    ) -> CoreResult<()> {
        self.record(format!("property_value_changing {}", member(id, property)));
        Ok(())
    }

    fn property_value_changed(
        &self,
        _tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        _old_value: &Value,
        _new_value: &Value,
    ) {
        self.record(format!("property_value_changed {}", member(id, property)));
    }

    fn relation_reading(
        &self,
        _tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        access: ValueAccess,
    ) -> CoreResult<()> {
        self.record(format!(
            "relation_reading {}{}",
            member(id, property),
            access_suffix(access)
        ));
        Ok(())
    }

    fn relation_read_object(
        &self,
        _tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        _related: Option<&ObjectId>,
        access: ValueAccess,
    ) {
        self.record(format!(
            "relation_read {}{}",
            member(id, property),
            access_suffix(access)
        ));
    }

    fn relation_read_collection(
        &self,
        _tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        related: &[ObjectId],
        access: ValueAccess,
    ) {
        self.record(format!(
            "relation_read {} [{}]{}",
            member(id, property),
            related.len(),
            access_suffix(access)
        ));
    }

    fn relation_changing(
        &self,
        _tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        _old_related: Option<&ObjectId>,
        _new_related: Option<&ObjectId>,
    ) -> CoreResult<()> {
        self.record(format!("relation_changing {}", member(id, property)));
        Ok(())
    }

    fn relation_changed(
        &self,
        _tx: &ClientTransaction,
        id: &ObjectId,
        property: &str,
        _old_related: Option<&ObjectId>,
        _new_related: Option<&ObjectId>,
    ) {
        self.record(format!("relation_changed {}", member(id, property)));
    }

    fn filter_query_result(&self, _tx: &ClientTransaction, result: QueryResult) -> QueryResult {
        self.record(format!("filter_query_result {}", result.len()));
        result
    }

    fn filter_custom_query_result(
        &self,
        _tx: &ClientTransaction,
        _query: &CustomQuery,
        rows: Vec<QueryRow>,
    ) -> Vec<QueryRow> {
        self.record(format!("filter_custom_query_result {}", rows.len()));
        rows
    }

    fn committing(&self, _tx: &mut ClientTransaction, ids: &[ObjectId]) -> CoreResult<()> {
        self.record(format!("committing {}", ids.len()));
        Ok(())
    }

    fn commit_validate(&self, _tx: &ClientTransaction, data: &[PersistableData]) -> CoreResult<()> {
        self.record(format!("commit_validate {}", data.len()));
        Ok(())
    }

    fn committed(&self, _tx: &ClientTransaction, ids: &[ObjectId]) {
        self.record(format!("committed {}", ids.len()));
    }

    fn rolling_back(&self, _tx: &mut ClientTransaction, ids: &[ObjectId]) -> CoreResult<()> {
        self.record(format!("rolling_back {}", ids.len()));
        Ok(())
    }

    fn rolled_back(&self, _tx: &ClientTransaction, ids: &[ObjectId]) {
        self.record(format!("rolled_back {}", ids.len()));
    }
}

/// Lifecycle points a [`VetoExtension`] can cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VetoPoint {
    /// `sub_transaction_creating`
    SubTransaction,
    /// `new_object_creating`
    NewObject,
    /// `objects_loading`
    Loading,
    /// `object_deleting`
    Deleting,
    /// `property_value_changing`
    PropertyChanging,
    /// `relation_changing`
    RelationChanging,
    /// `committing`
    Committing,
    /// `commit_validate`
    CommitValidate,
    /// `rolling_back`
    RollingBack,
}

/// Fails one kind of before-hook with [`CoreError::InvalidOperation`].
#[derive(Debug)]
pub struct VetoExtension {
    point: VetoPoint,
}

impl VetoExtension {
    /// Key the extension registers under.
    pub const KEY: &'static str = "veto";

    /// Creates an extension that cancels the given point.
    pub fn new(point: VetoPoint) -> Self {
        Self { point }
    }

    fn check(&self, point: VetoPoint) -> CoreResult<()> {
        if self.point == point {
            return Err(CoreError::invalid_operation(format!("vetoed at {point:?}")));
        }
        Ok(())
    }
}

impl ClientTransactionExtension for VetoExtension {
    fn key(&self) -> &str {
        Self::KEY
    }

    fn sub_transaction_creating(&self, _tx: &ClientTransaction) -> CoreResult<()> {
        self.check(VetoPoint::SubTransaction)
    }

    fn new_object_creating(&self, _tx: &ClientTransaction, _class_id: &str) -> CoreResult<()> {
        self.check(VetoPoint::NewObject)
    }

    fn objects_loading(&self, _tx: &ClientTransaction, _ids: &[ObjectId]) -> CoreResult<()> {
        self.check(VetoPoint::Loading)
    }

    fn object_deleting(&self, _tx: &ClientTransaction, _id: &ObjectId) -> CoreResult<()> {
        self.check(VetoPoint::Deleting)
    }

    fn property_value_changing(
        &self,
        _tx: &ClientTransaction,
        _id: &ObjectId,
        _property: &str,
        _old_value: &Value,
        _new_value: &Value,
    ) -> CoreResult<()> {
        self.check(VetoPoint::PropertyChanging)
    }

    fn relation_changing(
        &self,
        _tx: &ClientTransaction,
        _id: &ObjectId,
        _property: &str,
        _old_related: Option<&ObjectId>,
        _new_related: Option<&ObjectId>,
    ) -> CoreResult<()> {
        self.check(VetoPoint::RelationChanging)
    }

    fn committing(&self, _tx: &mut ClientTransaction, _ids: &[ObjectId]) -> CoreResult<()> {
        self.check(VetoPoint::Committing)
    }

    fn commit_validate(&self, _tx: &ClientTransaction, _data: &[PersistableData]) -> CoreResult<()> {
        self.check(VetoPoint::CommitValidate)
    }

    fn rolling_back(&self, _tx: &mut ClientTransaction, _ids: &[ObjectId]) -> CoreResult<()> {
        self.check(VetoPoint::RollingBack)
    }
}

/// Removes the given objects from every query result.
#[derive(Debug)]
pub struct HideObjectsExtension {
    hidden: Vec<ObjectId>,
}

impl HideObjectsExtension {
    /// Key the extension registers under.
    pub const KEY: &'static str = "hide";

    /// Creates a filter hiding `hidden`.
    pub fn new(hidden: Vec<ObjectId>) -> Self {
        Self { hidden }
    }
}

impl ClientTransactionExtension for HideObjectsExtension {
    fn key(&self) -> &str {
        Self::KEY
    }

    fn filter_query_result(&self, _tx: &ClientTransaction, result: QueryResult) -> QueryResult {
        result.filter(|id| !self.hidden.contains(id))
    }
}

/// Writes a property of one object while the transaction commits.
#[derive(Debug)]
pub struct SetOnCommitExtension {
    id: ObjectId,
    property: String,
    value: Value,
}

impl SetOnCommitExtension {
    /// Key the extension registers under.
    pub const KEY: &'static str = "set-on-commit";

    /// Creates an extension that sets `property` of `id` to `value` in `committing`.
    pub fn new(id: ObjectId, property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id,
            property: property.into(),
            value: value.into(),
        }
    }
}

impl ClientTransactionExtension for SetOnCommitExtension {
    fn key(&self) -> &str {
        Self::KEY
    }

    fn committing(&self, tx: &mut ClientTransaction, _ids: &[ObjectId]) -> CoreResult<()> {
        tx.set_value(&self.id, &self.property, self.value.clone())
    }
}

//! Per-object property storage.

use crate::mapping::ClassDefinition;
use crate::object::{ObjectId, Value};
use crate::types::ValueAccess;
use std::collections::BTreeMap;

/// Lifecycle of a data container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerState {
    /// Created in the transaction, not yet persisted.
    New,
    /// Loaded from the data source.
    Existing,
    /// Marked for deletion.
    Deleted,
}

/// Current and original value of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    current: Value,
    original: Value,
}

impl PropertyValue {
    /// Creates an unchanged property value.
    pub fn new(value: Value) -> Self {
        Self {
            current: value.clone(),
            original: value,
        }
    }

    /// Returns the current value.
    pub fn current(&self) -> &Value {
        &self.current
    }

    /// Returns the value as loaded or last committed.
    pub fn original(&self) -> &Value {
        &self.original
    }

    /// Returns true if current and original differ.
    pub fn has_changed(&self) -> bool {
        self.current != self.original
    }

    fn get(&self, access: ValueAccess) -> &Value {
        match access {
            ValueAccess::Current => &self.current,
            ValueAccess::Original => &self.original,
        }
    }
}

/// Property values of one domain object, foreign keys included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataContainer {
    id: ObjectId,
    state: ContainerState,
    created_in_transaction: bool,
    timestamp: Option<u64>,
    values: BTreeMap<String, PropertyValue>,
}

impl DataContainer {
    /// Creates a container for a new object with the class's initial values.
    pub fn new_object(id: ObjectId, class: &ClassDefinition) -> Self {
        let values = class
            .properties()
            .iter()
            .map(|p| (p.name().to_string(), PropertyValue::new(p.initial_value())))
            .collect();
        Self {
            id,
            state: ContainerState::New,
            created_in_transaction: true,
            timestamp: None,
            values,
        }
    }

    /// Creates a container for an object loaded from a data source.
    pub fn existing(id: ObjectId, timestamp: u64, values: BTreeMap<String, Value>) -> Self {
        Self {
            id,
            state: ContainerState::Existing,
            created_in_transaction: false,
            timestamp: Some(timestamp),
            values: values
                .into_iter()
                .map(|(k, v)| (k, PropertyValue::new(v)))
                .collect(),
        }
    }

    /// Returns the object ID.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// Storage timestamp the object was loaded with; `None` until first persisted.
    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Returns true if the object was created in this transaction and never committed.
    pub fn is_created_in_transaction(&self) -> bool {
        self.created_in_transaction
    }

    /// Returns a property value.
    pub fn value(&self, name: &str, access: ValueAccess) -> Option<&Value> {
        self.values.get(name).map(|v| v.get(access))
    }

    /// Iterates over all property values in name order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Current values, as written to storage.
    pub fn current_values(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.current.clone()))
            .collect()
    }

    /// Returns true if any property differs from its original.
    pub fn has_changed_values(&self) -> bool {
        self.values.values().any(PropertyValue::has_changed)
    }

    pub(crate) fn set_value(&mut self, name: &str, value: Value) {
        match self.values.get_mut(name) {
            Some(property) => property.current = value,
            None => {
                self.values.insert(
                    name.to_string(),
                    PropertyValue {
                        current: value,
                        original: Value::Null,
                    },
                );
            }
        }
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.state = ContainerState::Deleted;
    }

    /// Accepts current values as originals.
    pub(crate) fn commit(&mut self, timestamp: Option<u64>) {
        for value in self.values.values_mut() {
            value.original = value.current.clone();
        }
        self.state = ContainerState::Existing;
        self.created_in_transaction = false;
        if timestamp.is_some() {
            self.timestamp = timestamp;
        }
    }

    /// Restores original values. The caller discards new objects.
    pub(crate) fn rollback(&mut self) {
        for value in self.values.values_mut() {
            value.current = value.original.clone();
        }
        if self.state == ContainerState::Deleted {
            self.state = ContainerState::Existing;
        }
    }

    /// Copy seen by a sub-transaction: current values become unchanged originals.
    pub(crate) fn to_child_copy(&self) -> Self {
        Self::existing(
            self.id.clone(),
            self.timestamp.unwrap_or(0),
            self.current_values(),
        )
    }
}

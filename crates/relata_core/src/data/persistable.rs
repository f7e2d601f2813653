//! Frozen snapshots of changed objects handed to validators and storage.

use crate::data::{DataContainer, RelationValue};
use crate::object::ObjectId;
use crate::types::ObjectState;
use std::collections::BTreeMap;

/// Immutable snapshot of one changed object at commit time.
///
/// Built only for `New`, `Changed` and `Deleted` objects. End-point values
/// contain every foreign-key end-point and the virtual end-points the
/// transaction has loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistableData {
    id: ObjectId,
    state: ObjectState,
    container: DataContainer,
    end_points: BTreeMap<String, RelationValue>,
}

impl PersistableData {
    pub(crate) fn new(
        state: ObjectState,
        container: DataContainer,
        end_points: BTreeMap<String, RelationValue>,
    ) -> Self {
        Self {
            id: container.id().clone(),
            state,
            container,
            end_points,
        }
    }

    /// Returns the object ID.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Returns the object's state.
    pub fn state(&self) -> ObjectState {
        self.state
    }

    /// Returns the object's property values.
    pub fn container(&self) -> &DataContainer {
        &self.container
    }

    /// Returns the value of a loaded end-point.
    pub fn end_point(&self, property_name: &str) -> Option<&RelationValue> {
        self.end_points.get(property_name)
    }

    /// Iterates over loaded end-points.
    pub fn end_points(&self) -> impl Iterator<Item = (&str, &RelationValue)> {
        self.end_points.iter().map(|(k, v)| (k.as_str(), v))
    }
}

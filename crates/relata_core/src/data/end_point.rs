//! Loaded state of virtual relation end-points.

use crate::object::ObjectId;
use crate::types::ValueAccess;

/// Contents of a relation end-point as seen by validators and extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationValue {
    /// Single-valued end-point.
    Object(Option<ObjectId>),
    /// Collection end-point.
    Collection(Vec<ObjectId>),
}

impl RelationValue {
    /// Returns true if the end-point references no object.
    pub fn is_empty(&self) -> bool {
        match self {
            RelationValue::Object(id) => id.is_none(),
            RelationValue::Collection(ids) => ids.is_empty(),
        }
    }
}

/// Current and original contents of a virtual end-point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EndPointData {
    Object {
        current: Option<ObjectId>,
        original: Option<ObjectId>,
    },
    Collection {
        current: Vec<ObjectId>,
        original: Vec<ObjectId>,
    },
}

impl EndPointData {
    pub(crate) fn empty(is_collection: bool) -> Self {
        if is_collection {
            EndPointData::Collection {
                current: Vec::new(),
                original: Vec::new(),
            }
        } else {
            EndPointData::Object {
                current: None,
                original: None,
            }
        }
    }

    pub(crate) fn value(&self, access: ValueAccess) -> RelationValue {
        match (self, access) {
            (EndPointData::Object { current, .. }, ValueAccess::Current) => {
                RelationValue::Object(current.clone())
            }
            (EndPointData::Object { original, .. }, ValueAccess::Original) => {
                RelationValue::Object(original.clone())
            }
            (EndPointData::Collection { current, .. }, ValueAccess::Current) => {
                RelationValue::Collection(current.clone())
            }
            (EndPointData::Collection { original, .. }, ValueAccess::Original) => {
                RelationValue::Collection(original.clone())
            }
        }
    }

    /// Collections compare as multisets; reordering alone is not a change.
    pub(crate) fn has_changed(&self) -> bool {
        match self {
            EndPointData::Object { current, original } => current != original,
            EndPointData::Collection { current, original } => {
                if current.len() != original.len() {
                    return true;
                }
                let mut a: Vec<_> = current.iter().collect();
                let mut b: Vec<_> = original.iter().collect();
                a.sort();
                b.sort();
                a != b
            }
        }
    }

    pub(crate) fn set_object(&mut self, object: Option<ObjectId>) {
        if let EndPointData::Object { current, .. } = self {
            *current = object;
        }
    }

    pub(crate) fn insert(&mut self, index: usize, item: ObjectId) {
        if let EndPointData::Collection { current, .. } = self {
            let index = index.min(current.len());
            current.insert(index, item);
        }
    }

    pub(crate) fn remove(&mut self, item: &ObjectId) {
        if let EndPointData::Collection { current, .. } = self {
            if let Some(pos) = current.iter().position(|i| i == item) {
                current.remove(pos);
            }
        }
    }

    /// Overwrites the current contents, keeping the original.
    pub(crate) fn replace_current(&mut self, value: RelationValue) {
        match (self, value) {
            (EndPointData::Object { current, .. }, RelationValue::Object(related)) => {
                *current = related;
            }
            (EndPointData::Collection { current, .. }, RelationValue::Collection(related)) => {
                *current = related;
            }
            _ => {}
        }
    }

    pub(crate) fn commit(&mut self) {
        match self {
            EndPointData::Object { current, original } => *original = current.clone(),
            EndPointData::Collection { current, original } => *original = current.clone(),
        }
    }

    pub(crate) fn rollback(&mut self) {
        match self {
            EndPointData::Object { current, original } => *current = original.clone(),
            EndPointData::Collection { current, original } => *current = original.clone(),
        }
    }

    /// Drops every reference to an object that became invalid.
    pub(crate) fn forget(&mut self, id: &ObjectId) {
        match self {
            EndPointData::Object { current, original } => {
                if current.as_ref() == Some(id) {
                    *current = None;
                }
                if original.as_ref() == Some(id) {
                    *original = None;
                }
            }
            EndPointData::Collection { current, original } => {
                current.retain(|i| i != id);
                original.retain(|i| i != id);
            }
        }
    }
}

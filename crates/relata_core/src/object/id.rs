//! Object identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a domain object: the mapped class plus a 128-bit key.
///
/// Object IDs are:
/// - Immutable once assigned
/// - Unique within a class
/// - Displayed as `<ClassId>|<uuid>`
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    class_id: String,
    value: [u8; 16],
}

impl ObjectId {
    /// Creates a new random ID for an object of the given class.
    #[must_use]
    pub fn new(class_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            value: Uuid::new_v4().into_bytes(),
        }
    }

    /// Creates an ID from raw key bytes.
    #[must_use]
    pub fn from_bytes(class_id: impl Into<String>, value: [u8; 16]) -> Self {
        Self {
            class_id: class_id.into(),
            value,
        }
    }

    /// Creates an ID from a UUID.
    #[must_use]
    pub fn from_uuid(class_id: impl Into<String>, uuid: Uuid) -> Self {
        Self::from_bytes(class_id, uuid.into_bytes())
    }

    /// Returns the class this object belongs to.
    #[inline]
    #[must_use]
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    /// Returns the raw key bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.value
    }

    /// Converts the key to a UUID.
    #[must_use]
    pub fn to_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.value)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}|{})", self.class_id, self.to_uuid())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.class_id, self.to_uuid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        let id1 = ObjectId::new("Order");
        let id2 = ObjectId::new("Order");
        assert_ne!(id1, id2);
    }

    #[test]
    fn same_key_different_class_differs() {
        let a = ObjectId::from_bytes("Order", [1; 16]);
        let b = ObjectId::from_bytes("Customer", [1; 16]);
        assert_ne!(a, b);
    }

    #[test]
    fn uuid_conversion() {
        let uuid = Uuid::new_v4();
        let id = ObjectId::from_uuid("Order", uuid);
        assert_eq!(id.to_uuid(), uuid);
        assert_eq!(id.class_id(), "Order");
    }

    #[test]
    fn display() {
        let id = ObjectId::from_bytes("Order", [0; 16]);
        assert_eq!(
            format!("{id}"),
            "Order|00000000-0000-0000-0000-000000000000"
        );
    }
}

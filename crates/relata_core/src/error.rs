//! Error types for Relata core.

use crate::object::ObjectId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in client transaction operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Record store error, propagated unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] relata_storage::StorageError),

    /// A stored record could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// The requested object does not exist in the data source.
    #[error("object '{id}' could not be found")]
    ObjectNotFound {
        /// The missing object.
        id: ObjectId,
    },

    /// The object was discarded or its deletion was committed.
    #[error("object '{id}' is invalid in this transaction")]
    ObjectInvalid {
        /// The invalid object.
        id: ObjectId,
    },

    /// The object is deleted and cannot be modified.
    #[error("object '{id}' is already deleted")]
    ObjectDeleted {
        /// The deleted object.
        id: ObjectId,
    },

    /// A mandatory relation end-point is empty at commit.
    #[error("{message}")]
    MandatoryRelationNotSet {
        /// Fully qualified name of the end-point property.
        property_name: String,
        /// The offending object.
        object_id: ObjectId,
        /// Human-readable message.
        message: String,
    },

    /// A non-nullable property holds null at commit.
    #[error("property '{property_name}' of domain object '{object_id}' must not be null")]
    PropertyValueNotNullable {
        /// Fully qualified property name.
        property_name: String,
        /// The offending object.
        object_id: ObjectId,
    },

    /// A text property exceeds its maximum length at commit.
    #[error(
        "value for property '{property_name}' of domain object '{object_id}' is too long: \
         maximum length is {max_length}, actual length is {actual_length}"
    )]
    PropertyValueTooLong {
        /// Fully qualified property name.
        property_name: String,
        /// The offending object.
        object_id: ObjectId,
        /// Allowed length.
        max_length: usize,
        /// Actual length.
        actual_length: usize,
    },

    /// A value of the wrong type was assigned to a property.
    #[error("property '{property_name}' expects a value of type {expected}, got {actual}")]
    TypeMismatch {
        /// Fully qualified property name.
        property_name: String,
        /// Declared type.
        expected: String,
        /// Type of the assigned value.
        actual: String,
    },

    /// The class is not part of the mapping.
    #[error("class '{class_id}' is not mapped")]
    UnknownClass {
        /// The unknown class id.
        class_id: String,
    },

    /// The property is not defined on the class.
    #[error("class '{class_id}' has no property '{property_name}'")]
    UnknownProperty {
        /// Class searched.
        class_id: String,
        /// Missing property.
        property_name: String,
    },

    /// The mapping configuration is inconsistent.
    #[error("invalid mapping: {message}")]
    Mapping {
        /// Description of the problem.
        message: String,
    },

    /// Stored data changed since the object was loaded.
    #[error("concurrency violation: object '{id}' was modified or created by another transaction")]
    ConcurrencyViolation {
        /// The conflicting object.
        id: ObjectId,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an object-not-found error.
    pub fn object_not_found(id: &ObjectId) -> Self {
        Self::ObjectNotFound { id: id.clone() }
    }

    /// Creates an object-invalid error.
    pub fn object_invalid(id: &ObjectId) -> Self {
        Self::ObjectInvalid { id: id.clone() }
    }

    /// Creates an object-deleted error.
    pub fn object_deleted(id: &ObjectId) -> Self {
        Self::ObjectDeleted { id: id.clone() }
    }

    /// Creates a mandatory-relation error for an empty single-valued end-point.
    pub fn mandatory_relation_null(property_name: impl Into<String>, object_id: &ObjectId) -> Self {
        let property_name = property_name.into();
        let message = format!(
            "Mandatory relation property '{property_name}' of domain object '{object_id}' cannot be null."
        );
        Self::MandatoryRelationNotSet {
            property_name,
            object_id: object_id.clone(),
            message,
        }
    }

    /// Creates a mandatory-relation error for an empty collection end-point.
    pub fn mandatory_relation_empty(
        property_name: impl Into<String>,
        object_id: &ObjectId,
    ) -> Self {
        let property_name = property_name.into();
        let message = format!(
            "Mandatory relation property '{property_name}' of domain object '{object_id}' contains no items."
        );
        Self::MandatoryRelationNotSet {
            property_name,
            object_id: object_id.clone(),
            message,
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates an unknown-class error.
    pub fn unknown_class(class_id: impl Into<String>) -> Self {
        Self::UnknownClass {
            class_id: class_id.into(),
        }
    }

    /// Creates an unknown-property error.
    pub fn unknown_property(class_id: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self::UnknownProperty {
            class_id: class_id.into(),
            property_name: property_name.into(),
        }
    }

    /// Creates a mapping error.
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            message: message.into(),
        }
    }

    /// Creates a concurrency violation error.
    pub fn concurrency_violation(id: &ObjectId) -> Self {
        Self::ConcurrencyViolation { id: id.clone() }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns the object a commit error refers to, if any.
    #[must_use]
    pub fn offending_object(&self) -> Option<&ObjectId> {
        match self {
            Self::MandatoryRelationNotSet { object_id, .. }
            | Self::PropertyValueNotNullable { object_id, .. }
            | Self::PropertyValueTooLong { object_id, .. }
            | Self::ConcurrencyViolation { id: object_id } => Some(object_id),
            _ => None,
        }
    }
}

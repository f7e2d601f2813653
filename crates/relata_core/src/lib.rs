//! # Relata Core
//!
//! Client transactions over a graph of mapped domain objects.
//!
//! A [`ClientTransaction`] loads objects through a [`StorageProvider`] (or
//! from its parent, for sub-transactions), tracks every property and relation
//! change and writes the changed set in one batch when committed. Commits are
//! checked by the [`CommitValidator`]; mandatory relations that are not set
//! cancel the commit and leave the transaction as it was.
//!
//! ## Key Components
//!
//! - [`MappingConfiguration`] - Classes, properties and relation end-points
//! - [`ClientTransaction`] - Unit of work: load, modify, commit, roll back
//! - [`ClientTransactionExtension`] - Observer of every lifecycle point
//! - [`RecordStorageProvider`] - Stores objects as CBOR records in a
//!   [`relata_storage::RecordStore`]
//!
//! ## Object States
//!
//! Every object has an [`ObjectState`] within a transaction. The state is
//! derived from the values: an object whose properties and loaded relations
//! equal their originals is `Unchanged`, even if it was modified and changed
//! back.
//!
//! ## Example
//!
//! ```rust,ignore
//! use relata_core::{ClientTransaction, RecordStorageProvider};
//! use relata_storage::InMemoryRecordStore;
//! use std::sync::Arc;
//!
//! let storage = Arc::new(RecordStorageProvider::new(InMemoryRecordStore::new(), mapping.clone()));
//! let mut tx = ClientTransaction::new(mapping, storage);
//!
//! let customer = tx.new_object("Customer")?;
//! let order = tx.new_object("Order")?;
//! tx.set_related_object(&order, "Customer", Some(&customer))?;
//! tx.commit()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod data;
mod error;
mod extension;
mod mapping;
mod object;
mod query;
mod stats;
mod storage;
mod transaction;
mod types;
mod validation;

pub use config::Config;
pub use data::{ContainerState, DataContainer, PersistableData, PropertyValue, RelationValue};
pub use error::{CoreError, CoreResult};
pub use extension::{ClientTransactionExtension, ExtensionCollection};
pub use mapping::{
    Cardinality, ClassDefinition, EndPoint, EndPointRef, MappingBuilder, MappingConfiguration,
    PropertyDefinition, PropertyType, RelationEndPointDefinition,
};
pub use object::{DomainObject, ObjectId, Value};
pub use query::{CustomQuery, Query, QueryResult, QueryRow, SortOrder};
pub use stats::{StatsSnapshot, TransactionStats};
pub use storage::{RecordStorageProvider, StorageProvider, StoredRecord};
pub use transaction::{ClientTransaction, SubTransactionRejected, TransactionBuilder};
pub use types::{ObjectState, TransactionId, ValueAccess};
pub use validation::{
    CommitValidator, MandatoryRelationValidator, PersistableDataValidator,
    PropertyConstraintValidator,
};

//! # Relata Storage
//!
//! Record store trait and implementations for Relata.
//!
//! This crate is the lowest-level persistence abstraction used by the
//! client transaction layer. Record stores are **opaque keyed byte stores**:
//! they map a [`RecordKey`] (class id + 16-byte object key) to a payload and
//! never interpret the payload.
//!
//! ## Design Principles
//!
//! - A batch of [`RecordWrite`]s is applied atomically or not at all
//! - No knowledge of domain objects, mappings or relations
//! - Must be `Send + Sync` so a store can be shared between transactions
//!
//! ## Available Stores
//!
//! - [`InMemoryRecordStore`] - For testing and ephemeral data
//! - [`FileRecordStore`] - Append-only batch log replayed on open
//!
//! ## Example
//!
//! ```rust
//! use relata_storage::{InMemoryRecordStore, RecordKey, RecordStore, RecordWrite};
//!
//! let store = InMemoryRecordStore::new();
//! let key = RecordKey::new("Customer", [7; 16]);
//! store
//!     .apply(&[RecordWrite::put(key.clone(), b"payload".to_vec())])
//!     .unwrap();
//! assert_eq!(store.get(&key).unwrap(), Some(b"payload".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileRecordStore;
pub use memory::InMemoryRecordStore;
pub use store::{RecordKey, RecordStore, RecordWrite};

//! Core type definitions for Relata.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a client transaction.
///
/// Transaction IDs are monotonically increasing within a process and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a transaction ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide transaction ID.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

/// Lifecycle state of a domain object within one client transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectState {
    /// The transaction has not loaded the object.
    NotLoadedYet,
    /// Created in this transaction and not yet committed.
    New,
    /// Loaded and equal to its original values.
    Unchanged,
    /// Loaded and at least one property or relation differs from its original.
    Changed,
    /// Marked for deletion; still readable until commit.
    Deleted,
    /// Discarded or deleted-and-committed; only identity queries are allowed.
    Invalid,
}

impl ObjectState {
    /// Returns true for states that take part in a commit.
    #[must_use]
    pub fn is_changed(self) -> bool {
        matches!(self, Self::New | Self::Changed | Self::Deleted)
    }
}

impl fmt::Display for ObjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotLoadedYet => "NotLoadedYet",
            Self::New => "New",
            Self::Unchanged => "Unchanged",
            Self::Changed => "Changed",
            Self::Deleted => "Deleted",
            Self::Invalid => "Invalid",
        };
        f.write_str(name)
    }
}

/// Which value of a property or relation is being accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueAccess {
    /// The value as currently modified in the transaction.
    Current,
    /// The value as loaded or last committed.
    Original,
}

//! Error types for the courier-history crate.

use courier_common::DeliveryItemId;
use thiserror::Error;

/// History store error type.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Item not found in the store.
    #[error("Delivery item not found: {0}")]
    NotFound(DeliveryItemId),

    /// The store has reached its configured capacity.
    #[error("History capacity exceeded: {len}/{capacity} items")]
    CapacityExceeded { len: usize, capacity: usize },

    /// The operation was cancelled before it completed.
    #[error("History operation cancelled")]
    Cancelled,

    /// The backend is unreachable or refused the operation.
    #[error("History store unavailable: {0}")]
    Unavailable(String),

    /// Internal error (lock poisoning, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

impl<T> From<std::sync::PoisonError<T>> for HistoryError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}

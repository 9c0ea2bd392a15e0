use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order exists with the given id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The persistence medium could not be reached or refused the write.
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to an order.
    #[error("Corrupt order record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },
}

impl StoreError {
    /// Returns true if the error refers to an unknown order id.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

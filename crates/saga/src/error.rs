//! Saga error types.

use common::OrderId;
use domain::OrderStatus;
use order_store::StoreError;
use thiserror::Error;

/// Errors that abort a saga run.
///
/// Downstream step failures are never reported here: they end up in the
/// order's terminal status and step reports. Only faults of the system
/// itself surface as a `SagaError`.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The order store failed at a checkpoint.
    #[error("Order store error: {0}")]
    Storage(#[from] StoreError),

    /// The saga tried to move an order out of a terminal status.
    #[error("Invalid status transition for order {order_id}: {from} -> {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl SagaError {
    /// Returns true if the error refers to an unknown order.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SagaError::Storage(e) if e.is_not_found())
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

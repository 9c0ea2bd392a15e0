//! Saga step machine.

use domain::OrderStatus;
use serde::{Deserialize, Serialize};

/// A step of the order creation pipeline.
///
/// Steps run strictly in declaration order:
/// ```text
/// InventoryCheck ──► FraudCheck ──► InventoryReserve ──► Payment ──► Shipping ──► Notification
///       │                │                 │                │
///       ▼                ▼                 ▼                ▼
/// failed_inventory  rejected_fraud  failed_inventory  payment_failed (+ release inventory)
/// ```
/// Shipping and notification failures are recorded but never stop the saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    InventoryCheck,
    FraudCheck,
    InventoryReserve,
    Payment,
    Shipping,
    Notification,
}

impl SagaStep {
    /// All steps in pipeline order.
    pub const ALL: [SagaStep; 6] = [
        SagaStep::InventoryCheck,
        SagaStep::FraudCheck,
        SagaStep::InventoryReserve,
        SagaStep::Payment,
        SagaStep::Shipping,
        SagaStep::Notification,
    ];

    /// The step every saga starts with.
    pub fn first() -> Self {
        SagaStep::InventoryCheck
    }

    /// The step following this one, or `None` after the last step.
    pub fn next(&self) -> Option<SagaStep> {
        match self {
            SagaStep::InventoryCheck => Some(SagaStep::FraudCheck),
            SagaStep::FraudCheck => Some(SagaStep::InventoryReserve),
            SagaStep::InventoryReserve => Some(SagaStep::Payment),
            SagaStep::Payment => Some(SagaStep::Shipping),
            SagaStep::Shipping => Some(SagaStep::Notification),
            SagaStep::Notification => None,
        }
    }

    /// Returns true if a failure of this step can end the saga.
    ///
    /// The fraud check is fatal only on an explicit verdict; transport
    /// failures fail open.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SagaStep::Shipping | SagaStep::Notification)
    }

    /// Returns true if the saga may still be abandoned before this step.
    ///
    /// Only steps issued before any downstream state is committed qualify.
    /// Once the reservation has been issued the saga runs to a terminal
    /// status.
    pub fn is_abandonable(&self) -> bool {
        matches!(
            self,
            SagaStep::InventoryCheck | SagaStep::FraudCheck | SagaStep::InventoryReserve
        )
    }

    /// Returns the step name as used in logs, metrics and the journal.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStep::InventoryCheck => "inventory_check",
            SagaStep::FraudCheck => "fraud_check",
            SagaStep::InventoryReserve => "inventory_reserve",
            SagaStep::Payment => "payment",
            SagaStep::Shipping => "shipping",
            SagaStep::Notification => "notification",
        }
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of advancing the saga by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Run the given step next.
    Continue(SagaStep),
    /// Stop and persist the given terminal status.
    Finish(OrderStatus),
}

impl Transition {
    /// Continues with the step after `step`, or completes the order after
    /// the last one.
    pub fn after(step: SagaStep) -> Self {
        match step.next() {
            Some(next) => Transition::Continue(next),
            None => Transition::Finish(OrderStatus::Completed),
        }
    }
}

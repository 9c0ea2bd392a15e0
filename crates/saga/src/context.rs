//! Per-run saga state and the outcome handed back to callers.

use std::time::Instant;

use common::OrderId;
use domain::{Money, NewOrder, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::order_fulfillment;
use crate::services::{
    Acknowledgment, Availability, FraudVerdict, PaymentConfirmation, Reservation, Shipment,
    StepError,
};

/// What a single step produced: its success payload or a failure detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepReport<T> {
    Failed { error: StepError },
    Succeeded(T),
}

impl<T> StepReport<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, StepReport::Succeeded(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            StepReport::Succeeded(value) => Some(value),
            StepReport::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&StepError> {
        match self {
            StepReport::Failed { error } => Some(error),
            StepReport::Succeeded(_) => None,
        }
    }
}

impl<T> From<Result<T, StepError>> for StepReport<T> {
    fn from(result: Result<T, StepError>) -> Self {
        match result {
            Ok(value) => StepReport::Succeeded(value),
            Err(error) => StepReport::Failed { error },
        }
    }
}

/// Results gathered from the steps that ran, keyed by response field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_check: Option<StepReport<Availability>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_check: Option<StepReport<FraudVerdict>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<StepReport<Reservation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<StepReport<PaymentConfirmation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<StepReport<Shipment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<StepReport<Acknowledgment>>,
}

impl StepResults {
    /// Returns how many steps have a recorded result.
    pub fn recorded(&self) -> usize {
        [
            self.inventory_check.is_some(),
            self.fraud_check.is_some(),
            self.pricing.is_some(),
            self.payment.is_some(),
            self.shipping.is_some(),
            self.notification.is_some(),
        ]
        .into_iter()
        .filter(|recorded| *recorded)
        .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationAction {
    /// Give back the units reserved for the order.
    ReleaseInventory,
}

/// A compensating action that became due for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationRecord {
    pub order_id: OrderId,
    pub action: CompensationAction,
    pub product_name: String,
    pub quantity: u32,
    /// The step failure that made the compensation necessary.
    pub cause: StepError,
}

/// Final result of a saga run, shaped as the order creation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub steps: StepResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<String>,
}

impl OrderOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }
}

/// Ephemeral state of one saga run. Discarded once the outcome is built.
#[derive(Debug)]
pub(crate) struct SagaContext {
    pub order_id: OrderId,
    pub order: NewOrder,
    /// Placeholder total handed to the fraud check.
    pub estimated_total: Money,
    /// Total committed by the inventory reservation.
    pub committed_total: Option<Money>,
    pub results: StepResults,
    pub compensation: Option<CompensationRecord>,
    pub started: Instant,
}

impl SagaContext {
    pub fn new(order_id: OrderId, order: NewOrder) -> Self {
        let estimated_total = order.estimated_total();
        Self {
            order_id,
            order,
            estimated_total,
            committed_total: None,
            results: StepResults::default(),
            compensation: None,
            started: Instant::now(),
        }
    }

    pub fn into_outcome(self, status: OrderStatus, reason: Option<String>) -> OrderOutcome {
        OrderOutcome {
            order_id: self.order_id,
            status,
            reason,
            steps: self.results,
            compensation: self
                .compensation
                .map(|_| order_fulfillment::COMPENSATION_NOTE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_report_serializes_as_error_object() {
        let report: StepReport<Shipment> = StepReport::Failed {
            error: StepError::network("refused"),
        };

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"error": {"kind": "network", "detail": "refused"}})
        );
        assert!(!report.is_success());
    }

    #[test]
    fn test_succeeded_report_serializes_payload() {
        let report = StepReport::Succeeded(Availability::available());

        assert_eq!(serde_json::to_value(&report).unwrap(), json!({"available": true}));
        assert!(report.success().is_some());
    }

    #[test]
    fn test_outcome_omits_missing_steps() {
        let order = NewOrder::new(1, "Laptop", 1, "123 Test St", "4111111111111111").unwrap();
        let mut ctx = SagaContext::new(OrderId::new(3), order);
        ctx.results.inventory_check = Some(StepReport::Succeeded(Availability::unavailable()));

        let outcome = ctx.into_outcome(
            OrderStatus::FailedInventory,
            Some("Inventory not available".to_string()),
        );

        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "order_id": 3,
                "status": "failed_inventory",
                "reason": "Inventory not available",
                "inventory_check": {"available": false}
            })
        );
        assert_eq!(outcome.steps.recorded(), 1);
    }

    #[test]
    fn test_outcome_reports_compensation_note() {
        let order = NewOrder::new(1, "Laptop", 1, "123 Test St", "4111111111111111").unwrap();
        let mut ctx = SagaContext::new(OrderId::new(4), order);
        ctx.compensation = Some(CompensationRecord {
            order_id: OrderId::new(4),
            action: CompensationAction::ReleaseInventory,
            product_name: "Laptop".to_string(),
            quantity: 1,
            cause: StepError::timeout(std::time::Duration::from_secs(3)),
        });

        let outcome = ctx.into_outcome(OrderStatus::PaymentFailed, None);

        assert_eq!(outcome.compensation.as_deref(), Some("Inventory released"));
    }

    #[test]
    fn test_context_estimates_hundred_per_unit() {
        let order = NewOrder::new(1, "Laptop", 4, "123 Test St", "4111111111111111").unwrap();
        let ctx = SagaContext::new(OrderId::new(1), order);
        assert_eq!(ctx.estimated_total, Money::from_dollars(400));
        assert!(ctx.committed_total.is_none());
    }
}

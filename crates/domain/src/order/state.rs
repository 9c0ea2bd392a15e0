//! Order status machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The persisted status of an order.
///
/// State transitions:
/// ```text
///           ┌──► failed_inventory
///           ├──► rejected_fraud
/// pending ──┼──► payment_failed
///           ├──► completed
///           └──► cancelled
/// ```
///
/// `pending` is the only non-terminal status. A terminal status is never
/// overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order row written, saga in progress.
    #[default]
    Pending,

    /// Inventory was unavailable, the availability check failed, or the
    /// reservation could not be made (terminal).
    FailedInventory,

    /// The fraud service returned a positive verdict (terminal).
    RejectedFraud,

    /// Payment failed after inventory was reserved; a release compensation
    /// was recorded (terminal).
    PaymentFailed,

    /// Every fatal step succeeded (terminal).
    Completed,

    /// The caller abandoned the request before any downstream side effect
    /// was committed (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Returns true if an order in this status may move to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(self, OrderStatus::Pending) && next.is_terminal()
    }

    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::FailedInventory => "failed_inventory",
            OrderStatus::RejectedFraud => "rejected_fraud",
            OrderStatus::PaymentFailed => "payment_failed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "failed_inventory" => Ok(OrderStatus::FailedInventory),
            "rejected_fraud" => Ok(OrderStatus::RejectedFraud),
            "payment_failed" => Ok(OrderStatus::PaymentFailed),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::FailedInventory,
        OrderStatus::RejectedFraud,
        OrderStatus::PaymentFailed,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_only_pending_is_non_terminal() {
        for status in ALL {
            assert_eq!(status.is_terminal(), status != OrderStatus::Pending);
        }
    }

    #[test]
    fn test_pending_moves_to_any_terminal_status() {
        for status in ALL.into_iter().filter(OrderStatus::is_terminal) {
            assert!(OrderStatus::Pending.can_transition_to(status));
        }
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_status_is_never_overwritten() {
        for from in ALL.into_iter().filter(OrderStatus::is_terminal) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_display_matches_parse() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(OrderStatus::RejectedFraud.to_string(), "rejected_fraud");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err, OrderError::UnknownStatus("shipped".to_string()));
    }

    #[test]
    fn test_serialization_is_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PaymentFailed).unwrap();
        assert_eq!(json, "\"payment_failed\"");
    }
}

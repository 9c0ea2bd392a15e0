//! Order creation saga constants.

/// The saga type identifier recorded in the journal.
pub const SAGA_TYPE: &str = "OrderCreation";

pub const REASON_INVENTORY_UNAVAILABLE: &str = "Inventory not available";
pub const REASON_FRAUD_DETECTED: &str = "Fraud detected";
pub const REASON_RESERVATION_FAILED: &str = "Failed to reserve inventory";
pub const REASON_PAYMENT_FAILED: &str = "Payment failed";
pub const REASON_ABANDONED: &str = "Request abandoned";

/// Response note attached when the payment-failure compensation fires.
pub const COMPENSATION_NOTE: &str = "Inventory released";

/// Reason reported on a fraud verdict produced by failing open.
pub const FRAUD_FAIL_OPEN_REASON: &str = "fail-open";

//! Saga configuration.

use std::time::Duration;

use crate::state::SagaStep;

/// Default deadline for a single step call.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(3);

/// Default domain for notification recipients.
pub const DEFAULT_NOTIFICATION_DOMAIN: &str = "example.com";

/// Default number of orders whose journal is kept in memory.
pub const DEFAULT_JOURNAL_RETENTION: usize = 10_000;

/// Per-step deadlines.
///
/// A call that exceeds its deadline is treated exactly like a transport
/// error for that step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimeouts {
    pub inventory_check: Duration,
    pub fraud_check: Duration,
    pub inventory_reserve: Duration,
    pub payment: Duration,
    pub shipping: Duration,
    pub notification: Duration,
}

impl StepTimeouts {
    /// Uses the same deadline for every step.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            inventory_check: timeout,
            fraud_check: timeout,
            inventory_reserve: timeout,
            payment: timeout,
            shipping: timeout,
            notification: timeout,
        }
    }

    /// Returns the deadline for a step.
    pub fn for_step(&self, step: SagaStep) -> Duration {
        match step {
            SagaStep::InventoryCheck => self.inventory_check,
            SagaStep::FraudCheck => self.fraud_check,
            SagaStep::InventoryReserve => self.inventory_reserve,
            SagaStep::Payment => self.payment,
            SagaStep::Shipping => self.shipping,
            SagaStep::Notification => self.notification,
        }
    }

    /// Overrides the deadline of a single step.
    pub fn with_step(mut self, step: SagaStep, timeout: Duration) -> Self {
        let slot = match step {
            SagaStep::InventoryCheck => &mut self.inventory_check,
            SagaStep::FraudCheck => &mut self.fraud_check,
            SagaStep::InventoryReserve => &mut self.inventory_reserve,
            SagaStep::Payment => &mut self.payment,
            SagaStep::Shipping => &mut self.shipping,
            SagaStep::Notification => &mut self.notification,
        };
        *slot = timeout;
        self
    }
}

impl Default for StepTimeouts {
    fn default() -> Self {
        Self::uniform(DEFAULT_STEP_TIMEOUT)
    }
}

/// Settings handed to the orchestrator at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaConfig {
    pub timeouts: StepTimeouts,
    /// Domain appended to `user_{requester_id}@` for notification recipients.
    pub notification_domain: String,
    /// Number of most recent orders kept by the in-memory journal.
    pub journal_retention: usize,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            timeouts: StepTimeouts::default(),
            notification_domain: DEFAULT_NOTIFICATION_DOMAIN.to_string(),
            journal_retention: DEFAULT_JOURNAL_RETENTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts_are_uniform() {
        let timeouts = StepTimeouts::default();
        for step in SagaStep::ALL {
            assert_eq!(timeouts.for_step(step), DEFAULT_STEP_TIMEOUT);
        }
    }

    #[test]
    fn test_with_step_overrides_only_that_step() {
        let timeouts = StepTimeouts::uniform(Duration::from_secs(1))
            .with_step(SagaStep::Payment, Duration::from_millis(250));

        assert_eq!(
            timeouts.for_step(SagaStep::Payment),
            Duration::from_millis(250)
        );
        assert_eq!(timeouts.for_step(SagaStep::Shipping), Duration::from_secs(1));
    }

    #[test]
    fn test_default_config() {
        let config = SagaConfig::default();
        assert_eq!(config.notification_domain, "example.com");
        assert_eq!(config.journal_retention, DEFAULT_JOURNAL_RETENTION);
        assert_eq!(config.timeouts, StepTimeouts::default());
    }
}

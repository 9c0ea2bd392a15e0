//! Step client traits, in-memory implementations, and HTTP implementations.

pub mod fraud;
pub mod http;
pub mod inventory;
pub mod notification;
pub mod payment;
pub mod shipping;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fraud::{FraudRequest, FraudService, FraudVerdict, HttpFraudService, InMemoryFraudService};
pub use http::{HttpTransport, ServiceEndpoints};
pub use inventory::{
    Availability, HttpInventoryService, InMemoryInventoryService, InventoryRequest,
    InventoryService, Pricing, Reservation,
};
pub use notification::{
    Acknowledgment, HttpNotificationService, InMemoryNotificationService, NotificationChannel,
    NotificationRequest, NotificationService,
};
pub use payment::{
    HttpPaymentService, InMemoryPaymentService, PaymentConfirmation, PaymentRequest,
    PaymentService,
};
pub use shipping::{
    HttpShippingService, InMemoryShippingService, Shipment, ShipmentRequest, ShippingService,
};

/// Classification of a failed step call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepErrorKind {
    /// The service could not be reached.
    Network,
    /// No response arrived within the step deadline.
    Timeout,
    /// The service answered with a non-2xx status.
    Status,
    /// The response body did not match the expected shape.
    InvalidResponse,
    /// The service answered but explicitly declined the request.
    Declined,
}

impl StepErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepErrorKind::Network => "network",
            StepErrorKind::Timeout => "timeout",
            StepErrorKind::Status => "status",
            StepErrorKind::InvalidResponse => "invalid_response",
            StepErrorKind::Declined => "declined",
        }
    }
}

impl std::fmt::Display for StepErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failed step call, converted into a structured value at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {detail}")]
pub struct StepError {
    pub kind: StepErrorKind,
    pub detail: String,
    /// HTTP status code, for `Status` and `Declined` failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl StepError {
    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::Network,
            detail: detail.into(),
            status: None,
        }
    }

    pub fn timeout(deadline: Duration) -> Self {
        Self {
            kind: StepErrorKind::Timeout,
            detail: format!("no response within {}ms", deadline.as_millis()),
            status: None,
        }
    }

    pub fn status(code: u16, body: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::Status,
            detail: body.into(),
            status: Some(code),
        }
    }

    pub fn invalid_response(detail: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::InvalidResponse,
            detail: detail.into(),
            status: None,
        }
    }

    pub fn declined(detail: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::Declined,
            detail: detail.into(),
            status: None,
        }
    }

    /// Returns true for network, timeout, status and decoding failures, as
    /// opposed to an explicit refusal by the service.
    pub fn is_transport(&self) -> bool {
        !matches!(self.kind, StepErrorKind::Declined)
    }
}

/// Scripted behavior of an in-memory step client.
#[derive(Debug, Clone, Default)]
pub enum Behavior {
    /// Answer immediately with the configured response.
    #[default]
    Succeed,
    /// Answer with the configured response after a delay.
    Delay(Duration),
    /// Fail with the given error.
    Fail(StepError),
    /// Never answer.
    Hang,
}

impl Behavior {
    /// Plays the scripted behavior. Returns once the configured response
    /// should be produced, or with the scripted error.
    pub(crate) async fn play(self) -> Result<(), StepError> {
        match self {
            Behavior::Succeed => Ok(()),
            Behavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Behavior::Fail(error) => Err(error),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

/// The outbound capabilities a saga run depends on.
#[derive(Clone)]
pub struct StepClients {
    pub inventory: Arc<dyn InventoryService>,
    pub fraud: Arc<dyn FraudService>,
    pub payment: Arc<dyn PaymentService>,
    pub shipping: Arc<dyn ShippingService>,
    pub notification: Arc<dyn NotificationService>,
}

impl StepClients {
    /// Builds HTTP-backed clients sharing one transport.
    pub fn http(transport: HttpTransport, endpoints: &ServiceEndpoints) -> Self {
        Self {
            inventory: Arc::new(HttpInventoryService::new(
                transport.clone(),
                &endpoints.inventory,
            )),
            fraud: Arc::new(HttpFraudService::new(transport.clone(), &endpoints.fraud)),
            payment: Arc::new(HttpPaymentService::new(transport.clone(), &endpoints.payment)),
            shipping: Arc::new(HttpShippingService::new(
                transport.clone(),
                &endpoints.shipping,
            )),
            notification: Arc::new(HttpNotificationService::new(
                transport,
                &endpoints.notification,
            )),
        }
    }
}

/// In-memory clients for every step, with handles kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStepClients {
    pub inventory: InMemoryInventoryService,
    pub fraud: InMemoryFraudService,
    pub payment: InMemoryPaymentService,
    pub shipping: InMemoryShippingService,
    pub notification: InMemoryNotificationService,
}

impl InMemoryStepClients {
    /// Creates clients where every step succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns trait-object handles sharing state with these clients.
    pub fn clients(&self) -> StepClients {
        StepClients {
            inventory: Arc::new(self.inventory.clone()),
            fraud: Arc::new(self.fraud.clone()),
            payment: Arc::new(self.payment.clone()),
            shipping: Arc::new(self.shipping.clone()),
            notification: Arc::new(self.notification.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_serialization() {
        let json = serde_json::to_value(StepError::status(504, "gateway timeout")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "status", "detail": "gateway timeout", "status": 504})
        );

        let json = serde_json::to_value(StepError::network("connection refused")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "network", "detail": "connection refused"})
        );
    }

    #[test]
    fn test_timeout_detail_names_deadline() {
        let err = StepError::timeout(Duration::from_millis(1500));
        assert_eq!(err.kind, StepErrorKind::Timeout);
        assert_eq!(err.to_string(), "timeout: no response within 1500ms");
    }

    #[test]
    fn test_declined_is_not_transport() {
        assert!(!StepError::declined("card declined").is_transport());
        assert!(StepError::network("refused").is_transport());
        assert!(StepError::timeout(Duration::from_secs(1)).is_transport());
        assert!(StepError::status(500, "").is_transport());
        assert!(StepError::invalid_response("bad json").is_transport());
    }

    #[tokio::test]
    async fn test_behavior_fail_returns_error() {
        let err = Behavior::Fail(StepError::network("down"))
            .play()
            .await
            .unwrap_err();
        assert_eq!(err.kind, StepErrorKind::Network);
    }

    #[tokio::test(start_paused = true)]
    async fn test_behavior_hang_never_resolves() {
        let result =
            tokio::time::timeout(Duration::from_secs(60), Behavior::Hang.play()).await;
        assert!(result.is_err());
    }
}

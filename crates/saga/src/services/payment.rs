//! Payment service trait, in-memory implementation, and HTTP client.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{Money, mask_instrument};
use serde::{Deserialize, Serialize};

use super::http::{HttpTransport, endpoint};
use super::{Behavior, StepError};

/// A charge against the committed order total.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub card_number: String,
}

impl std::fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRequest")
            .field("order_id", &self.order_id)
            .field("amount", &self.amount)
            .field("card_number", &mask_instrument(&self.card_number))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Trait for payment processing operations.
///
/// Implementations return `Ok` only for a successful charge; a response
/// reporting `success: false` is surfaced as a declined [`StepError`].
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn process(&self, request: &PaymentRequest) -> Result<PaymentConfirmation, StepError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    charges: Vec<PaymentRequest>,
    next_id: u32,
    behavior: Behavior,
}

/// In-memory payment service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        self.state.write().unwrap().behavior = behavior;
    }

    /// Returns the number of charge attempts received.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    /// Returns every charge attempt received, oldest first.
    pub fn charges(&self) -> Vec<PaymentRequest> {
        self.state.read().unwrap().charges.clone()
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn process(&self, request: &PaymentRequest) -> Result<PaymentConfirmation, StepError> {
        let behavior = {
            let mut state = self.state.write().unwrap();
            state.charges.push(request.clone());
            state.behavior.clone()
        };
        behavior.play().await?;

        let mut state = self.state.write().unwrap();
        state.next_id += 1;
        Ok(PaymentConfirmation {
            success: true,
            transaction_id: Some(format!("TXN-{:06}", state.next_id)),
            message: None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpPaymentService {
    transport: HttpTransport,
    process_url: String,
}

impl HttpPaymentService {
    pub fn new(transport: HttpTransport, base_url: &str) -> Self {
        Self {
            transport,
            process_url: endpoint(base_url, "/payment/process"),
        }
    }
}

#[async_trait]
impl PaymentService for HttpPaymentService {
    async fn process(&self, request: &PaymentRequest) -> Result<PaymentConfirmation, StepError> {
        let confirmation: PaymentConfirmation =
            self.transport.post_json(&self.process_url, request).await?;

        if !confirmation.success {
            return Err(StepError::declined(
                confirmation
                    .message
                    .unwrap_or_else(|| "payment declined".to_string()),
            ));
        }
        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StepErrorKind;

    fn charge() -> PaymentRequest {
        PaymentRequest {
            order_id: OrderId::new(7),
            amount: Money::from_cents(99_999),
            card_number: "4111111111111111".to_string(),
        }
    }

    #[test]
    fn test_debug_masks_card_number() {
        let debug = format!("{:?}", charge());
        assert!(debug.contains("************1111"));
        assert!(!debug.contains("4111111111111111"));
    }

    #[tokio::test]
    async fn test_in_memory_issues_transaction_ids() {
        let service = InMemoryPaymentService::new();

        let first = service.process(&charge()).await.unwrap();
        let second = service.process(&charge()).await.unwrap();

        assert!(first.success);
        assert_eq!(first.transaction_id.as_deref(), Some("TXN-000001"));
        assert_eq!(second.transaction_id.as_deref(), Some("TXN-000002"));
        assert_eq!(service.charge_count(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_failure_still_records_attempt() {
        let service = InMemoryPaymentService::new();
        service.set_behavior(Behavior::Fail(StepError::declined("Insufficient funds")));

        let err = service.process(&charge()).await.unwrap_err();

        assert_eq!(err.kind, StepErrorKind::Declined);
        assert_eq!(service.charges(), vec![charge()]);
    }

    #[tokio::test]
    async fn test_http_process_sends_full_card_number() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/payment/process")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "order_id": 7,
                "amount": 999.99,
                "card_number": "4111111111111111"
            })))
            .with_status(200)
            .with_body(r#"{"success": true, "transaction_id": "txn_42", "message": "ok"}"#)
            .create_async()
            .await;

        let service =
            HttpPaymentService::new(HttpTransport::new(reqwest::Client::new()), &server.url());
        let confirmation = service.process(&charge()).await.unwrap();

        assert_eq!(confirmation.transaction_id.as_deref(), Some("txn_42"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_unsuccessful_body_is_declined() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/payment/process")
            .with_status(200)
            .with_body(r#"{"success": false, "message": "Card rejected"}"#)
            .create_async()
            .await;

        let service =
            HttpPaymentService::new(HttpTransport::new(reqwest::Client::new()), &server.url());
        let err = service.process(&charge()).await.unwrap_err();

        assert_eq!(err.kind, StepErrorKind::Declined);
        assert_eq!(err.detail, "Card rejected");
    }

    #[tokio::test]
    async fn test_http_non_2xx_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/payment/process")
            .with_status(402)
            .with_body("payment required")
            .create_async()
            .await;

        let service =
            HttpPaymentService::new(HttpTransport::new(reqwest::Client::new()), &server.url());
        let err = service.process(&charge()).await.unwrap_err();

        assert_eq!(err.kind, StepErrorKind::Status);
        assert_eq!(err.status, Some(402));
    }
}

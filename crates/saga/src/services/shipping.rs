//! Shipping service trait, in-memory implementation, and HTTP client.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::Money;
use serde::{Deserialize, Serialize};

use super::http::{HttpTransport, endpoint};
use super::{Behavior, StepError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub order_id: OrderId,
    pub address: String,
}

/// Result of a successful shipment creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub tracking_id: String,
    #[serde(default)]
    pub cost: Money,
}

/// Trait for shipping operations.
#[async_trait]
pub trait ShippingService: Send + Sync {
    /// Creates a shipment for the order.
    async fn ship(&self, request: &ShipmentRequest) -> Result<Shipment, StepError>;
}

#[derive(Debug, Default)]
struct InMemoryShippingState {
    shipments: Vec<ShipmentRequest>,
    behavior: Behavior,
}

/// In-memory shipping service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShippingService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl InMemoryShippingService {
    /// Creates a new in-memory shipping service.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        self.state.write().unwrap().behavior = behavior;
    }

    /// Returns the number of shipment requests received.
    pub fn shipment_count(&self) -> usize {
        self.state.read().unwrap().shipments.len()
    }
}

#[async_trait]
impl ShippingService for InMemoryShippingService {
    async fn ship(&self, request: &ShipmentRequest) -> Result<Shipment, StepError> {
        let behavior = {
            let mut state = self.state.write().unwrap();
            state.shipments.push(request.clone());
            state.behavior.clone()
        };
        behavior.play().await?;

        Ok(Shipment {
            order_id: Some(request.order_id),
            status: Some("shipped".to_string()),
            tracking_id: format!("TRK-{:08}", request.order_id.as_i64()),
            cost: Money::from_cents(1_000),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpShippingService {
    transport: HttpTransport,
    ship_url: String,
}

impl HttpShippingService {
    pub fn new(transport: HttpTransport, base_url: &str) -> Self {
        Self {
            transport,
            ship_url: endpoint(base_url, "/ship"),
        }
    }
}

#[async_trait]
impl ShippingService for HttpShippingService {
    async fn ship(&self, request: &ShipmentRequest) -> Result<Shipment, StepError> {
        self.transport.post_json(&self.ship_url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StepErrorKind;

    fn request() -> ShipmentRequest {
        ShipmentRequest {
            order_id: OrderId::new(12),
            address: "123 Test St".to_string(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_ship() {
        let service = InMemoryShippingService::new();

        let shipment = service.ship(&request()).await.unwrap();

        assert_eq!(shipment.tracking_id, "TRK-00000012");
        assert_eq!(shipment.order_id, Some(OrderId::new(12)));
        assert_eq!(service.shipment_count(), 1);
    }

    #[tokio::test]
    async fn test_http_ship_decodes_tracking() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ship")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({"order_id": 12, "address": "123 Test St"}),
            ))
            .with_status(200)
            .with_body(
                r#"{"order_id": 12, "status": "shipped", "tracking_id": "TRK-abc", "cost": 15.5}"#,
            )
            .create_async()
            .await;

        let service =
            HttpShippingService::new(HttpTransport::new(reqwest::Client::new()), &server.url());
        let shipment = service.ship(&request()).await.unwrap();

        assert_eq!(shipment.tracking_id, "TRK-abc");
        assert_eq!(shipment.cost, Money::from_cents(1_550));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_ship_without_tracking_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/ship")
            .with_status(200)
            .with_body(r#"{"status": "queued"}"#)
            .create_async()
            .await;

        let service =
            HttpShippingService::new(HttpTransport::new(reqwest::Client::new()), &server.url());
        let err = service.ship(&request()).await.unwrap_err();

        assert_eq!(err.kind, StepErrorKind::InvalidResponse);
    }
}

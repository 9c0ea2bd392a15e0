//! Inventory service trait, in-memory implementation, and HTTP client.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Money;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::http::{HttpTransport, endpoint};
use super::{Behavior, StepError};

/// Request body shared by the availability check and the reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRequest {
    pub product_name: String,
    pub quantity: u32,
}

/// Answer of an availability check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    /// A missing flag reads as unavailable.
    #[serde(default)]
    pub available: bool,
    /// Any additional fields the service returned.
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

impl Availability {
    pub fn available() -> Self {
        Self {
            available: true,
            detail: Map::new(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            detail: Map::new(),
        }
    }
}

/// Committed pricing returned by a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub unit_price: Money,
    pub total_price: Money,
}

/// Answer of a successful reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub pricing: Pricing,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

/// Inventory operations used by the order saga.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Checks whether the requested quantity is available.
    async fn check(&self, request: &InventoryRequest) -> Result<Availability, StepError>;

    /// Reserves the requested quantity and returns committed pricing.
    async fn reserve(&self, request: &InventoryRequest) -> Result<Reservation, StepError>;
}

#[derive(Debug)]
struct InMemoryInventoryState {
    available: bool,
    unit_price: Money,
    check_behavior: Behavior,
    reserve_behavior: Behavior,
    checks: Vec<InventoryRequest>,
    reservations: Vec<InventoryRequest>,
}

impl Default for InMemoryInventoryState {
    fn default() -> Self {
        Self {
            available: true,
            unit_price: Money::from_cents(99_999),
            check_behavior: Behavior::Succeed,
            reserve_behavior: Behavior::Succeed,
            checks: Vec::new(),
            reservations: Vec::new(),
        }
    }
}

/// In-memory inventory service for testing.
///
/// Reports every product as available at $999.99 per unit unless
/// configured otherwise.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryService {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryService {
    /// Creates a new in-memory inventory service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the availability reported by `check`.
    pub fn set_available(&self, available: bool) {
        self.state.write().unwrap().available = available;
    }

    /// Sets the unit price used to build reservation pricing.
    pub fn set_unit_price(&self, unit_price: Money) {
        self.state.write().unwrap().unit_price = unit_price;
    }

    pub fn set_check_behavior(&self, behavior: Behavior) {
        self.state.write().unwrap().check_behavior = behavior;
    }

    pub fn set_reserve_behavior(&self, behavior: Behavior) {
        self.state.write().unwrap().reserve_behavior = behavior;
    }

    /// Returns the number of availability checks received.
    pub fn check_count(&self) -> usize {
        self.state.read().unwrap().checks.len()
    }

    /// Returns the number of reservation requests received.
    pub fn reserve_count(&self) -> usize {
        self.state.read().unwrap().reservations.len()
    }

    /// Returns every reservation request received, oldest first.
    pub fn reservations(&self) -> Vec<InventoryRequest> {
        self.state.read().unwrap().reservations.clone()
    }
}

#[async_trait]
impl InventoryService for InMemoryInventoryService {
    async fn check(&self, request: &InventoryRequest) -> Result<Availability, StepError> {
        let behavior = {
            let mut state = self.state.write().unwrap();
            state.checks.push(request.clone());
            state.check_behavior.clone()
        };
        behavior.play().await?;

        let available = self.state.read().unwrap().available;
        Ok(if available {
            Availability::available()
        } else {
            Availability::unavailable()
        })
    }

    async fn reserve(&self, request: &InventoryRequest) -> Result<Reservation, StepError> {
        let behavior = {
            let mut state = self.state.write().unwrap();
            state.reservations.push(request.clone());
            state.reserve_behavior.clone()
        };
        behavior.play().await?;

        let unit_price = self.state.read().unwrap().unit_price;
        Ok(Reservation {
            pricing: Pricing {
                unit_price,
                total_price: unit_price.multiply(request.quantity),
            },
            detail: Map::new(),
        })
    }
}

/// Inventory client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpInventoryService {
    transport: HttpTransport,
    check_url: String,
    reserve_url: String,
}

impl HttpInventoryService {
    pub fn new(transport: HttpTransport, base_url: &str) -> Self {
        Self {
            transport,
            check_url: endpoint(base_url, "/inventory/check"),
            reserve_url: endpoint(base_url, "/inventory/reserve"),
        }
    }
}

#[async_trait]
impl InventoryService for HttpInventoryService {
    async fn check(&self, request: &InventoryRequest) -> Result<Availability, StepError> {
        self.transport.post_json(&self.check_url, request).await
    }

    async fn reserve(&self, request: &InventoryRequest) -> Result<Reservation, StepError> {
        self.transport.post_json(&self.reserve_url, request).await
    }
}

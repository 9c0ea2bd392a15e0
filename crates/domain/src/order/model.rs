//! Order request and persisted order record.

use chrono::{DateTime, Utc};
use common::{OrderId, RequesterId};
use serde::{Deserialize, Serialize};

use super::{Money, OrderError, OrderStatus};

/// Delivery address used when a request omits one.
pub const DEFAULT_ADDRESS: &str = "123 Main St, City, Country";

/// Payment instrument used when a request omits one.
pub const DEFAULT_PAYMENT_INSTRUMENT: &str = "1234567890123456";

/// Placeholder unit price used to derive an order's total.
///
/// The inventory reservation later quotes its own price, which is charged
/// but not reconciled with this figure.
pub const ESTIMATED_UNIT_PRICE_DOLLARS: i64 = 100;

/// Validated attributes of an order request.
///
/// Construction through [`NewOrder::new`] guarantees a positive quantity and
/// non-empty text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    requester_id: RequesterId,
    product_name: String,
    quantity: u32,
    address: String,
    payment_instrument: String,
}

impl NewOrder {
    /// Validates and builds a new order request.
    pub fn new(
        requester_id: i64,
        product_name: impl Into<String>,
        quantity: i64,
        address: impl Into<String>,
        payment_instrument: impl Into<String>,
    ) -> Result<Self, OrderError> {
        let product_name = product_name.into();
        let address = address.into();
        let payment_instrument = payment_instrument.into();

        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(OrderError::InvalidQuantity { quantity })?;

        if product_name.trim().is_empty() {
            return Err(OrderError::EmptyField {
                field: "product_name",
            });
        }
        if address.trim().is_empty() {
            return Err(OrderError::EmptyField { field: "address" });
        }
        if payment_instrument.trim().is_empty() {
            return Err(OrderError::EmptyField {
                field: "payment_instrument",
            });
        }

        Ok(Self {
            requester_id: RequesterId::new(requester_id),
            product_name,
            quantity,
            address,
            payment_instrument,
        })
    }

    pub fn requester_id(&self) -> RequesterId {
        self.requester_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The full payment instrument, only ever forwarded to the payment service.
    pub fn payment_instrument(&self) -> &str {
        &self.payment_instrument
    }

    /// The order total derived from the quantity at the placeholder price.
    pub fn estimated_total(&self) -> Money {
        Money::from_dollars(ESTIMATED_UNIT_PRICE_DOLLARS).multiply(self.quantity)
    }

    /// The instrument reference kept on the persisted record.
    pub fn masked_instrument(&self) -> String {
        mask_instrument(&self.payment_instrument)
    }
}

/// Masks all but the last four characters of a payment instrument.
pub fn mask_instrument(instrument: &str) -> String {
    let chars: Vec<char> = instrument.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    std::iter::repeat_n('*', hidden)
        .chain(chars[hidden..].iter().copied())
        .collect()
}

/// A persisted order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub requester_id: RequesterId,
    pub product_name: String,
    pub quantity: u32,
    pub address: String,
    /// Masked payment instrument reference.
    pub payment_instrument: String,
    /// Total derived at creation, never supplied by the requester.
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a pending order record from a validated request.
    pub fn pending(id: OrderId, new_order: &NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            requester_id: new_order.requester_id(),
            product_name: new_order.product_name().to_string(),
            quantity: new_order.quantity(),
            address: new_order.address().to_string(),
            payment_instrument: new_order.masked_instrument(),
            total: new_order.estimated_total(),
            status: OrderStatus::Pending,
            created_at,
        }
    }
}

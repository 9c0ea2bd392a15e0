//! Order model and related types.

mod model;
mod state;
mod value_objects;

pub use model::{
    DEFAULT_ADDRESS, DEFAULT_PAYMENT_INSTRUMENT, ESTIMATED_UNIT_PRICE_DOLLARS, NewOrder, Order,
    mask_instrument,
};
pub use state::OrderStatus;
pub use value_objects::Money;

use thiserror::Error;

/// Errors raised while validating an order request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Quantity must be a positive integer.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// A required text field was empty.
    #[error("Field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// A status string could not be recognized.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}

//! Domain layer for the order saga system.
//!
//! This crate provides the order model shared by the store, the saga
//! orchestrator, and the HTTP surface:
//! - `NewOrder`: validated attributes of an order request
//! - `Order`: the persisted order record
//! - `OrderStatus`: the pending → terminal status machine
//! - `Money`: integer-cents monetary amounts

pub mod order;

pub use order::{
    DEFAULT_ADDRESS, DEFAULT_PAYMENT_INSTRUMENT, ESTIMATED_UNIT_PRICE_DOLLARS, Money, NewOrder,
    Order, OrderError, OrderStatus, mask_instrument,
};

//! Shared identifier types used across the order saga crates.

mod types;

pub use types::{OrderId, RequesterId};

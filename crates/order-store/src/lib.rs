//! Order store for the order saga system.
//!
//! The store owns the persisted order records. It writes whatever status
//! it is told; sequencing of statuses is the orchestrator's job.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::OrderStore;

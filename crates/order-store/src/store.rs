use std::sync::Arc;

use async_trait::async_trait;
use domain::{NewOrder, Order, OrderStatus};

use crate::{OrderId, Result};

/// Core trait for order store implementations.
///
/// Implementations must support concurrent independent writes for distinct
/// order ids. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order with status `pending` and returns its id.
    ///
    /// Ids are assigned monotonically and never reused.
    async fn create(&self, order: &NewOrder) -> Result<OrderId>;

    /// Overwrites the status of an existing order.
    ///
    /// Fails with `NotFound` if the id is unknown. The write is visible to
    /// subsequent reads once this returns.
    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()>;

    /// Loads a single order.
    async fn get(&self, order_id: OrderId) -> Result<Order>;

    /// Returns a snapshot of all orders, most recent first.
    async fn list(&self) -> Result<Vec<Order>>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn create(&self, order: &NewOrder) -> Result<OrderId> {
        (**self).create(order).await
    }

    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        (**self).set_status(order_id, status).await
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        (**self).get(order_id).await
    }

    async fn list(&self) -> Result<Vec<Order>> {
        (**self).list().await
    }
}

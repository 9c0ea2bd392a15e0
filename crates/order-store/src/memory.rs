use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use domain::{NewOrder, Order, OrderStatus};
use tokio::sync::RwLock;

use crate::{OrderId, Result, StoreError, store::OrderStore};

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: BTreeMap<OrderId, Order>,
    next_id: i64,
    /// Every `set_status` call that reached the store, in order.
    status_writes: Vec<(OrderId, OrderStatus)>,
    unavailable: bool,
    reject_status_writes: bool,
}

/// In-memory order store.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// switches for simulating an unreachable medium in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail with `StoreError::Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Makes `set_status` fail with `StoreError::Unavailable` while
    /// `create` keeps working.
    pub async fn set_reject_status_writes(&self, reject: bool) {
        self.state.write().await.reject_status_writes = reject;
    }

    /// Returns the statuses written for an order after creation, oldest first.
    pub async fn status_writes(&self, order_id: OrderId) -> Vec<OrderStatus> {
        self.state
            .read()
            .await
            .status_writes
            .iter()
            .filter(|(id, _)| *id == order_id)
            .map(|(_, status)| *status)
            .collect()
    }

    /// Returns the total number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &NewOrder) -> Result<OrderId> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }

        state.next_id += 1;
        let order_id = OrderId::new(state.next_id);
        state
            .orders
            .insert(order_id, Order::pending(order_id, order, Utc::now()));

        tracing::debug!(%order_id, "order created");
        Ok(order_id)
    }

    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;
        if state.unavailable || state.reject_status_writes {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound(order_id))?;
        order.status = status;
        state.status_writes.push((order_id, status));

        tracing::debug!(%order_id, %status, "order status updated");
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }

        state
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotFound(order_id))
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }

        // Ids are monotonic, so descending id order is most-recent-first.
        Ok(state.orders.values().rev().cloned().collect())
    }
}

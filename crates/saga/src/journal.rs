//! Append-only audit trail of saga runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::context::CompensationRecord;
use crate::events::{JournalEntry, SagaEvent};

/// Storage for saga journal entries, keyed by order.
///
/// Appending never fails the saga: the journal is an audit aid, while the
/// order store remains the source of truth for status.
#[async_trait]
pub trait SagaJournal: Send + Sync {
    /// Appends an event for the order.
    async fn append(&self, order_id: OrderId, event: SagaEvent);

    /// Returns every entry recorded for the order, oldest first.
    async fn entries(&self, order_id: OrderId) -> Vec<JournalEntry>;
}

/// In-memory saga journal.
///
/// Unbounded when built with [`InMemorySagaJournal::new`]. A journal built
/// with [`InMemorySagaJournal::with_retention`] keeps the most recent orders
/// only and drops the oldest order's entries once the limit is exceeded.
#[derive(Debug, Clone, Default)]
pub struct InMemorySagaJournal {
    entries: Arc<RwLock<BTreeMap<OrderId, Vec<JournalEntry>>>>,
    max_orders: Option<usize>,
}

impl InMemorySagaJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps entries for at most `max_orders` orders (at least one).
    pub fn with_retention(max_orders: usize) -> Self {
        Self {
            entries: Arc::default(),
            max_orders: Some(max_orders.max(1)),
        }
    }

    /// Returns the number of orders with recorded entries.
    pub async fn order_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns the compensation records for the order.
    pub async fn compensations(&self, order_id: OrderId) -> Vec<CompensationRecord> {
        self.entries(order_id)
            .await
            .into_iter()
            .filter_map(|entry| match entry.event {
                SagaEvent::CompensationRecorded(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Returns the total number of entries across all orders.
    pub async fn len(&self) -> usize {
        self.entries.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SagaJournal for InMemorySagaJournal {
    async fn append(&self, order_id: OrderId, event: SagaEvent) {
        tracing::debug!(%order_id, event_type = event.event_type(), "journal entry");
        let mut entries = self.entries.write().await;
        entries
            .entry(order_id)
            .or_default()
            .push(JournalEntry::new(order_id, event));

        // Order ids are monotonic, so the first key is the oldest run.
        if let Some(max_orders) = self.max_orders {
            while entries.len() > max_orders {
                if let Some((evicted, _)) = entries.pop_first() {
                    tracing::debug!(order_id = %evicted, "journal entries evicted");
                }
            }
        }
    }

    async fn entries(&self, order_id: OrderId) -> Vec<JournalEntry> {
        self.entries
            .read()
            .await
            .get(&order_id)
            .cloned()
            .unwrap_or_default()
    }
}

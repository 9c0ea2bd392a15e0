use async_trait::async_trait;
use common::RequesterId;
use domain::{Money, NewOrder, Order, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{OrderId, Result, StoreError, store::OrderStore};

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Closes the connection pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let id: i64 = row.try_get("id")?;
        let quantity: i64 = row.try_get("quantity")?;
        let status: String = row.try_get("status")?;

        let quantity = u32::try_from(quantity).map_err(|_| StoreError::CorruptRecord {
            id,
            reason: format!("quantity {quantity} out of range"),
        })?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::CorruptRecord {
                id,
                reason: e.to_string(),
            })?;

        Ok(Order {
            id: OrderId::new(id),
            requester_id: RequesterId::new(row.try_get("requester_id")?),
            product_name: row.try_get("product_name")?,
            quantity,
            address: row.try_get("address")?,
            payment_instrument: row.try_get("payment_instrument")?,
            total: Money::from_cents(row.try_get("total_cents")?),
            status,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(product = order.product_name()))]
    async fn create(&self, order: &NewOrder) -> Result<OrderId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (requester_id, product_name, quantity, address, payment_instrument, total_cents, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(order.requester_id().as_i64())
        .bind(order.product_name())
        .bind(i64::from(order.quantity()))
        .bind(order.address())
        .bind(order.masked_instrument())
        .bind(order.estimated_total().cents())
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(OrderId::new(id))
    }

    #[tracing::instrument(skip(self))]
    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(status.as_str())
        .bind(order_id.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(order_id));
        }
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, requester_id, product_name, quantity, address, payment_instrument, total_cents, status, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(order_id))?;

        Self::row_to_order(row)
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, requester_id, product_name, quantity, address, payment_instrument, total_cents, status, created_at
            FROM orders
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}

//! Order creation, lookup and saga journal endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::OrderId;
use domain::{DEFAULT_ADDRESS, DEFAULT_PAYMENT_INSTRUMENT, NewOrder, Order};
use order_store::OrderStore;
use saga::{AbandonSignal, JournalEntry, OrderOrchestrator, OrderOutcome, SagaJournal};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: OrderOrchestrator,
    pub store: Arc<dyn OrderStore>,
    pub journal: Arc<dyn SagaJournal>,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(alias = "user_id")]
    pub requester_id: i64,
    pub product_name: String,
    pub quantity: i64,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_payment_instrument", alias = "card_number")]
    pub payment_instrument: String,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_payment_instrument() -> String {
    DEFAULT_PAYMENT_INSTRUMENT.to_string()
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

#[derive(Serialize)]
pub struct SagaJournalResponse {
    pub order_id: OrderId,
    pub status: domain::OrderStatus,
    pub events: Vec<JournalEntry>,
}

// -- Handlers --

/// POST /orders — create an order and run its saga to a terminal status.
///
/// The saga runs on its own task. If the caller disconnects, the run is
/// flagged as abandoned and stops before any step that would commit
/// downstream state; calls already in flight still complete.
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<OrderOutcome>, ApiError> {
    let Json(req) = payload?;
    let order = NewOrder::new(
        req.requester_id,
        req.product_name,
        req.quantity,
        req.address,
        req.payment_instrument,
    )?;

    let signal = AbandonSignal::new();
    let guard = signal.guard();
    let orchestrator = state.orchestrator.clone();
    let run = tokio::spawn(async move { orchestrator.run(order, &signal).await });

    let outcome = run
        .await
        .map_err(|e| ApiError::Internal(format!("saga task failed: {e}")))??;
    guard.disarm();

    tracing::info!(order_id = %outcome.order_id, status = %outcome.status, "order processed");
    Ok(Json(outcome))
}

/// GET /orders — all orders, most recent first.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<OrderListResponse>, ApiError> {
    let orders = state.store.list().await?;
    Ok(Json(OrderListResponse { orders }))
}

/// GET /orders/{id} — a single order record.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.store.get(order_id).await?;
    Ok(Json(order))
}

/// GET /orders/{id}/saga — the saga journal recorded for an order.
#[tracing::instrument(skip(state))]
pub async fn saga_journal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SagaJournalResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.store.get(order_id).await?;
    let events = state.journal.entries(order_id).await;

    Ok(Json(SagaJournalResponse {
        order_id,
        status: order.status,
        events,
    }))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id {id:?}: {e}")))
}

//! HTTP API server for order creation sagas.
//!
//! Exposes order creation (which runs the saga synchronously), order
//! lookup, the per-order saga journal, a health probe and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use saga::{InMemorySagaJournal, OrderOrchestrator, SagaConfig, SagaJournal, StepClients};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            get(routes::orders::list).post(routes::orders::create),
        )
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/saga", get(routes::orders::saga_journal))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around an order store and step clients.
///
/// The saga journal lives in memory whichever order store is used, so it is
/// lost on restart. It keeps the `saga_config.journal_retention` most recent
/// orders; older journals answer with an empty event list.
pub fn create_default_state(
    store: Arc<dyn OrderStore>,
    clients: StepClients,
    saga_config: SagaConfig,
) -> Arc<AppState> {
    let journal: Arc<dyn SagaJournal> = Arc::new(InMemorySagaJournal::with_retention(
        saga_config.journal_retention,
    ));
    let orchestrator =
        OrderOrchestrator::new(store.clone(), clients, journal.clone(), saga_config);

    Arc::new(AppState {
        orchestrator,
        store,
        journal,
    })
}

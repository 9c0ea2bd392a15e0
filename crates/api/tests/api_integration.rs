//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use saga::services::FraudVerdict;
use saga::{Behavior, InMemoryStepClients, SagaConfig, StepError};
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryOrderStore,
    clients: InMemoryStepClients,
}

fn setup() -> TestApp {
    setup_with(SagaConfig::default())
}

fn setup_with(saga_config: SagaConfig) -> TestApp {
    let store = InMemoryOrderStore::new();
    let clients = InMemoryStepClients::new();
    let state = api::create_default_state(Arc::new(store.clone()), clients.clients(), saga_config);
    let app = api::create_app(state, get_metrics_handle());
    TestApp {
        app,
        store,
        clients,
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn laptop_request() -> Value {
    json!({
        "requester_id": 123,
        "product_name": "Laptop",
        "quantity": 1,
        "address": "123 Test St",
        "payment_instrument": "4111111111111111"
    })
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();

    let (status, json) = send(&t.app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_create_order_completes() {
    let t = setup();

    let (status, json) = send(&t.app, post_json("/orders", &laptop_request())).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["order_id"].is_i64());
    assert_eq!(json["status"], "completed");
    for field in [
        "inventory_check",
        "fraud_check",
        "pricing",
        "payment",
        "shipping",
        "notification",
    ] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
}

#[tokio::test]
async fn test_create_order_accepts_original_field_names() {
    let t = setup();

    let (status, json) = send(
        &t.app,
        post_json(
            "/orders",
            &json!({"user_id": 5, "product_name": "Mouse", "quantity": 2, "card_number": "5500000000000004"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "completed");

    let charges = t.clients.payment.charges();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].card_number, "5500000000000004");

    let shipped_to = t.clients.notification.sent();
    assert_eq!(shipped_to[0].recipient, "user_5@example.com");
}

#[tokio::test]
async fn test_fraud_rejection_is_a_business_outcome() {
    let t = setup();
    t.clients
        .fraud
        .set_verdict(FraudVerdict::fraud("High value transaction risk"));

    let (status, json) = send(&t.app, post_json("/orders", &laptop_request())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "rejected_fraud");
    assert_eq!(json["reason"], "Fraud detected");
    assert_eq!(json["fraud_check"]["reason"], "High value transaction risk");
    assert_eq!(t.clients.payment.charge_count(), 0);
}

#[tokio::test]
async fn test_payment_failure_reports_compensation() {
    let t = setup();
    t.clients
        .payment
        .set_behavior(Behavior::Fail(StepError::status(502, "bad gateway")));

    let (status, json) = send(&t.app, post_json("/orders", &laptop_request())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "payment_failed");
    assert_eq!(json["compensation"], "Inventory released");
    assert_eq!(json["payment"]["error"]["kind"], "status");
}

#[tokio::test]
async fn test_create_order_rejects_invalid_quantity() {
    let t = setup();
    let mut body = laptop_request();
    body["quantity"] = json!(0);

    let (status, json) = send(&t.app, post_json("/orders", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
    assert_eq!(t.store.order_count().await, 0);
}

#[tokio::test]
async fn test_create_order_rejects_malformed_body() {
    let t = setup();

    let (status, json) = send(
        &t.app,
        post_json("/orders", &json!({"product_name": "Laptop"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_storage_failure_is_internal_error() {
    let t = setup();
    t.store.set_unavailable(true).await;

    let (status, json) = send(&t.app, post_json("/orders", &laptop_request())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_list_orders_most_recent_first() {
    let t = setup();
    t.clients.inventory.set_available(false);
    let (_, first) = send(&t.app, post_json("/orders", &laptop_request())).await;
    t.clients.inventory.set_available(true);
    let (_, second) = send(&t.app, post_json("/orders", &laptop_request())).await;

    let (status, json) = send(&t.app, get("/orders")).await;

    assert_eq!(status, StatusCode::OK);
    let orders = json["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], second["order_id"]);
    assert_eq!(orders[0]["status"], "completed");
    assert_eq!(orders[1]["id"], first["order_id"]);
    assert_eq!(orders[1]["status"], "failed_inventory");
    assert_eq!(orders[0]["payment_instrument"], "************1111");
}

#[tokio::test]
async fn test_get_order() {
    let t = setup();
    let (_, created) = send(&t.app, post_json("/orders", &laptop_request())).await;
    let id = created["order_id"].as_i64().unwrap();

    let (status, json) = send(&t.app, get(&format!("/orders/{id}"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id);
    assert_eq!(json["product_name"], "Laptop");
    assert_eq!(json["total"], 100.0);
    assert_eq!(json["status"], "completed");
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let t = setup();

    let (status, json) = send(&t.app, get("/orders/999")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let t = setup();

    let (status, _) = send(&t.app, get("/orders/not-a-number")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_saga_journal_for_order() {
    let t = setup();
    t.clients
        .payment
        .set_behavior(Behavior::Fail(StepError::declined("Insufficient funds")));
    let (_, created) = send(&t.app, post_json("/orders", &laptop_request())).await;
    let id = created["order_id"].as_i64().unwrap();

    let (status, json) = send(&t.app, get(&format!("/orders/{id}/saga"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "payment_failed");
    let types: Vec<&str> = json["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["event_type"].as_str())
        .collect();
    assert_eq!(types.first(), Some(&"SagaStarted"));
    assert_eq!(types.last(), Some(&"SagaFinished"));
    assert_eq!(
        types.iter().filter(|t| **t == "CompensationRecorded").count(),
        1
    );
}

#[tokio::test]
async fn test_saga_journal_for_unknown_order() {
    let t = setup();

    let (status, _) = send(&t.app, get("/orders/12345/saga")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_saga_journal_keeps_recent_orders_only() {
    let t = setup_with(SagaConfig {
        journal_retention: 1,
        ..SagaConfig::default()
    });
    let (_, first) = send(&t.app, post_json("/orders", &laptop_request())).await;
    let (_, second) = send(&t.app, post_json("/orders", &laptop_request())).await;

    let (status, json) = send(
        &t.app,
        get(&format!("/orders/{}/saga", first["order_id"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "completed");
    assert!(json["events"].as_array().unwrap().is_empty());

    let (_, json) = send(
        &t.app,
        get(&format!("/orders/{}/saga", second["order_id"])),
    )
    .await;
    assert!(!json["events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup();
    send(&t.app, post_json("/orders", &laptop_request())).await;

    let response = t.app.clone().oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("saga_executions_total"));
}

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::post,
    Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::json;
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

use pokeprint_backend::entities::orders;
use pokeprint_backend::handlers;
use pokeprint_backend::AppState;

use crate::common::{drained_statements, stripe_signature, test_state, TEST_WEBHOOK_SECRET};

fn webhook_state(db: DatabaseConnection) -> Arc<AppState> {
    // Payment and storage collaborators are never exercised by this route
    test_state(db, "http://127.0.0.1:1", "http://127.0.0.1:1")
}

fn webhook_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/webhooks/stripe",
            post(handlers::webhook::stripe_webhook),
        )
        .with_state(state)
}

/// Signature header with a caller-chosen timestamp, for replay tests
fn signature_at(payload: &str, secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

fn order_with_status(intent_id: &str, status: &str) -> orders::Model {
    orders::Model {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        stripe_payment_intent_id: intent_id.to_string(),
        card_type: "Pokemon".to_string(),
        element: "Fire".to_string(),
        pokemon_name: "Emberclaw".to_string(),
        hp: "120".to_string(),
        rarity: "Rare".to_string(),
        status: status.to_string(),
        personal_message: None,
        use_ai: false,
        ai_prompt: None,
        total_amount: 3498,
        line_items_persisted: Some(true),
        image_persisted: None,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

/// Full processor envelope; extra fields beyond the ones the handler
/// reads must be tolerated
fn succeeded_event(intent_id: &str) -> String {
    json!({
        "id": "evt_1PokePrintMe",
        "type": "payment_intent.succeeded",
        "created": Utc::now().timestamp(),
        "livemode": false,
        "data": { "object": { "id": intent_id, "amount": 3498, "currency": "usd" } }
    })
    .to_string()
}

fn deliver(payload: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A signed payment_intent.succeeded delivery moves the matching
/// pending order to paid
#[tokio::test]
async fn test_webhook_marks_pending_order_paid() {
    let order = order_with_status("pi_test_123", "pending");
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![order.clone()]])
        .append_query_results([vec![orders::Model {
            status: "paid".to_string(),
            ..order
        }]])
        .into_connection();

    let payload = succeeded_event("pi_test_123");
    let signature = stripe_signature(payload.as_bytes(), TEST_WEBHOOK_SECRET);

    let state = webhook_state(db);
    let response = webhook_router(state.clone())
        .oneshot(deliver(&payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "received": true }));

    // One lookup, one status update
    assert_eq!(drained_statements(state).len(), 2);
}

/// A signature computed over a different body is rejected before any
/// datastore access
#[tokio::test]
async fn test_webhook_rejects_tampered_payload() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let delivered = succeeded_event("pi_test_123");
    let signed_over = succeeded_event("pi_attacker");
    let signature = stripe_signature(signed_over.as_bytes(), TEST_WEBHOOK_SECRET);

    let state = webhook_state(db);
    let response = webhook_router(state.clone())
        .oneshot(deliver(&delivered, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Invalid signature" })
    );
    assert!(drained_statements(state).is_empty());
}

/// A delivery without the signature header is rejected outright
#[tokio::test]
async fn test_webhook_rejects_missing_header() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let response = webhook_router(webhook_state(db))
        .oneshot(deliver(&succeeded_event("pi_test_123"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Missing signature header" })
    );
}

/// A correctly signed but stale delivery is treated as a replay
#[tokio::test]
async fn test_webhook_rejects_stale_timestamp() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let payload = succeeded_event("pi_test_123");
    let stale = Utc::now().timestamp() - 400;
    let signature = signature_at(&payload, TEST_WEBHOOK_SECRET, stale);

    let state = webhook_state(db);
    let response = webhook_router(state.clone())
        .oneshot(deliver(&payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(drained_statements(state).is_empty());
}

/// Event types other than payment_intent.succeeded are acknowledged
/// without touching any order
#[tokio::test]
async fn test_webhook_ignores_other_event_types() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let payload = json!({
        "id": "evt_2PokePrintMe",
        "type": "payment_intent.created",
        "data": { "object": { "id": "pi_test_123" } }
    })
    .to_string();
    let signature = stripe_signature(payload.as_bytes(), TEST_WEBHOOK_SECRET);

    let state = webhook_state(db);
    let response = webhook_router(state.clone())
        .oneshot(deliver(&payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "received": true }));
    assert!(drained_statements(state).is_empty());
}

/// An intent with no matching order is acknowledged so the processor
/// stops redelivering
#[tokio::test]
async fn test_webhook_acks_unknown_intent() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<orders::Model>::new()])
        .into_connection();

    let payload = succeeded_event("pi_unknown");
    let signature = stripe_signature(payload.as_bytes(), TEST_WEBHOOK_SECRET);

    let state = webhook_state(db);
    let response = webhook_router(state.clone())
        .oneshot(deliver(&payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "received": true }));

    // Lookup only, no update
    assert_eq!(drained_statements(state).len(), 1);
}

/// Redelivery for an order that already left pending is acknowledged
/// without rewriting its status
#[tokio::test]
async fn test_webhook_acks_already_resolved_order() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![order_with_status("pi_test_123", "paid")]])
        .into_connection();

    let payload = succeeded_event("pi_test_123");
    let signature = stripe_signature(payload.as_bytes(), TEST_WEBHOOK_SECRET);

    let state = webhook_state(db);
    let response = webhook_router(state.clone())
        .oneshot(deliver(&payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "received": true }));
    assert_eq!(drained_statements(state).len(), 1);
}

/// A signed body that fails to parse is a bad request, not an ack
#[tokio::test]
async fn test_webhook_rejects_malformed_payload() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let payload = "not json at all";
    let signature = stripe_signature(payload.as_bytes(), TEST_WEBHOOK_SECRET);

    let response = webhook_router(webhook_state(db))
        .oneshot(deliver(payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Invalid payload" })
    );
}

/// Datastore failure yields a 500 so the processor retries the delivery
#[tokio::test]
async fn test_webhook_datastore_failure_requests_retry() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let payload = succeeded_event("pi_test_123");
    let signature = stripe_signature(payload.as_bytes(), TEST_WEBHOOK_SECRET);

    let response = webhook_router(webhook_state(db))
        .oneshot(deliver(&payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Internal server error" })
    );
}

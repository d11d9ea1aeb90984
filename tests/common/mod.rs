use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Form, Path, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sea_orm::{DatabaseConnection, Transaction};
use sha2::Sha256;
use uuid::Uuid;

use pokeprint_backend::config::AppConfig;
use pokeprint_backend::services::{payment::PaymentService, storage::StorageService};
use pokeprint_backend::AppState;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        stripe_webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        base_price_cents: 3498,
        ai_addon_price_cents: 999,
    }
}

/// Build an AppState whose collaborators point at the given stub
/// servers. Tests that never reach a collaborator can pass an
/// unroutable base URL.
pub fn test_state(db: DatabaseConnection, stripe_base: &str, storage_base: &str) -> Arc<AppState> {
    Arc::new(AppState {
        db,
        payment: PaymentService::new("sk_test_123".to_string(), stripe_base.to_string()),
        storage: StorageService::new(
            "service-key".to_string(),
            storage_base.to_string(),
            "order-images".to_string(),
        ),
        config: test_config(),
    })
}

/// Statements the mock datastore executed, drained from the state
/// handle. Callable once every router built from the handle has been
/// dropped, which `oneshot` guarantees by the time it returns.
pub fn drained_statements(state: Arc<AppState>) -> Vec<Transaction> {
    let Ok(state) = Arc::try_unwrap(state) else {
        panic!("state handle still shared");
    };
    state.db.into_transaction_log()
}

/// Bearer header value for an authenticated test user
#[allow(dead_code)]
pub fn auth_header(user_id: Uuid, email: &str) -> String {
    let token = pokeprint_backend::auth::issue_token(user_id, email, TEST_JWT_SECRET)
        .expect("failed to issue test token");
    format!("Bearer {}", token)
}

/// Payment intent creations captured by the stripe stub, as raw form
/// parameters keyed the way the processor API receives them
#[allow(dead_code)]
pub type CapturedIntents = Arc<Mutex<Vec<HashMap<String, String>>>>;

#[allow(dead_code)]
async fn stub_create_intent(
    State(captured): State<CapturedIntents>,
    Form(params): Form<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let amount: i64 = params
        .get("amount")
        .and_then(|a| a.parse().ok())
        .unwrap_or(0);
    captured.lock().unwrap().push(params);
    Json(serde_json::json!({
        "id": "pi_test_123",
        "client_secret": "pi_test_123_secret_456",
        "amount": amount,
        "currency": "usd",
        "status": "requires_payment_method"
    }))
}

/// Stand-in for the payment processor API on a local port
#[allow(dead_code)]
pub async fn spawn_stripe_stub() -> (String, CapturedIntents) {
    let captured: CapturedIntents = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1/payment_intents", post(stub_create_intent))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stripe stub");
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base_url, captured)
}

/// Uploads captured by the storage stub: bucket-relative path and size
#[allow(dead_code)]
pub type CapturedUploads = Arc<Mutex<Vec<(String, usize)>>>;

#[allow(dead_code)]
async fn stub_accept_upload(
    State(captured): State<CapturedUploads>,
    Path(path): Path<String>,
    body: axum::body::Bytes,
) -> Json<serde_json::Value> {
    captured.lock().unwrap().push((path.clone(), body.len()));
    Json(serde_json::json!({ "Key": format!("order-images/{}", path) }))
}

/// Stand-in for the object storage API on a local port
#[allow(dead_code)]
pub async fn spawn_storage_stub() -> (String, CapturedUploads) {
    let captured: CapturedUploads = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/storage/v1/object/order-images/{*path}",
            post(stub_accept_upload),
        )
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind storage stub");
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base_url, captured)
}

/// Signature header the way the processor signs deliveries: HMAC-SHA256
/// over "{timestamp}.{payload}"
#[allow(dead_code)]
pub fn stripe_signature(payload: &[u8], secret: &str) -> String {
    let timestamp = Utc::now().timestamp();
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

//! Payment processor client
//!
//! Talks to a Stripe-compatible HTTP API: opens payment intents for
//! order submissions and verifies the signature on webhook deliveries.
//! The base URL is injected so tests can point the client at a local
//! stand-in server.

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Webhook deliveries older than this are rejected as replays (seconds)
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct PaymentService {
    client: Client,
    secret_key: String,
    base_url: String,
}

/// Charge authorization opened for an order. The client completes the
/// payment against `client_secret`; the id is persisted on the order row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

/// Webhook envelope as delivered by the processor
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: WebhookObject,
}

/// The object a webhook event refers to; only the id is needed to
/// resolve the affected order
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    pub id: String,
}

/// Error types for payment processor calls
#[derive(Debug)]
pub enum PaymentError {
    RequestError(String),
    ApiError { status: u16, message: String },
    InvalidSignature(String),
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentError::RequestError(msg) => write!(f, "Request error: {}", msg),
            PaymentError::ApiError { status, message } => {
                write!(f, "Payment API error {}: {}", status, message)
            }
            PaymentError::InvalidSignature(msg) => write!(f, "Invalid signature: {}", msg),
        }
    }
}

impl std::error::Error for PaymentError {}

impl PaymentService {
    pub fn new(secret_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            base_url,
        }
    }

    /// Opens a payment intent for the given amount, tagged with the
    /// buyer and card identity so the charge is traceable from the
    /// processor dashboard. No idempotency key is sent; resubmitting an
    /// order opens a second intent.
    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        user_id: Uuid,
        pokemon_name: &str,
        card_type: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.base_url);
        let amount = amount_cents.to_string();
        let user_id = user_id.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", "usd"),
            ("metadata[user_id]", user_id.as_str()),
            ("metadata[pokemon_name]", pokemon_name),
            ("metadata[card_type]", card_type),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::ApiError { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::RequestError(e.to_string()))
    }
}

/// Verifies a `Stripe-Signature` style header against the raw request
/// body: the header carries a unix timestamp `t` and one or more `v1`
/// HMAC-SHA256 signatures over `"{t}.{body}"`. Stale timestamps are
/// rejected to bound replays.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<(), PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::InvalidSignature("missing timestamp".to_string()))?;
    if candidates.is_empty() {
        return Err(PaymentError::InvalidSignature(
            "missing v1 signature".to_string(),
        ));
    }

    let age = Utc::now().timestamp() - timestamp;
    if age > WEBHOOK_TOLERANCE_SECS {
        return Err(PaymentError::InvalidSignature(format!(
            "timestamp outside tolerance ({}s old)",
            age
        )));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    for candidate in candidates {
        if let Ok(signature) = hex::decode(candidate) {
            if mac.clone().verify_slice(&signature).is_ok() {
                return Ok(());
            }
        }
    }

    Err(PaymentError::InvalidSignature(
        "no matching v1 signature".to_string(),
    ))
}

//! Payment webhook handler
//!
//! POST /api/webhooks/stripe receives processor events over a signed
//! raw body. A `payment_intent.succeeded` event moves the matching
//! order from pending to paid. Events that do not apply (unknown type,
//! unknown intent, already-resolved order) are acknowledged with 200 so
//! the processor stops redelivering; only signature failures reject and
//! only datastore failures ask for a retry.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::entities::{orders, prelude::*};
use crate::models::order::ErrorResponse;
use crate::services::payment::{verify_webhook_signature, WebhookEvent};
use crate::AppState;

/// Event type that confirms a charge and resolves the order
const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let signature_header = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Webhook delivery without signature header");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Missing signature header".to_string(),
                }),
            )
        })?;

    if let Err(e) = verify_webhook_signature(
        &body,
        signature_header,
        &state.config.stripe_webhook_secret,
    ) {
        warn!(error = %e, "Webhook signature verification failed");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid signature".to_string(),
            }),
        ));
    }

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Webhook payload failed to parse");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid payload".to_string(),
            }),
        )
    })?;

    if event.event_type != PAYMENT_SUCCEEDED {
        info!(event_type = %event.event_type, "Ignoring webhook event type");
        return Ok(Json(serde_json::json!({ "received": true })));
    }

    let payment_intent_id = event.data.object.id;

    let order = Orders::find()
        .filter(orders::Column::StripePaymentIntentId.eq(&payment_intent_id))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Webhook order lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
        })?;

    let Some(order) = order else {
        // Could be an intent from another environment sharing the same
        // webhook endpoint; acknowledge so the processor stops retrying.
        warn!(payment_intent_id = %payment_intent_id, "No order for payment intent");
        return Ok(Json(serde_json::json!({ "received": true })));
    };

    if order.status != "pending" {
        info!(
            order_id = %order.id,
            status = %order.status,
            "Order already resolved; ignoring redelivery"
        );
        return Ok(Json(serde_json::json!({ "received": true })));
    }

    let order_id = order.id;
    let mut active = order.into_active_model();
    active.status = Set("paid".to_string());
    active.update(&state.db).await.map_err(|e| {
        error!(order_id = %order_id, error = %e, "Failed to mark order paid");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }),
        )
    })?;

    info!(
        order_id = %order_id,
        payment_intent_id = %payment_intent_id,
        "Order marked paid"
    );

    Ok(Json(serde_json::json!({ "received": true })))
}

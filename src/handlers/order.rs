//! Order submission and listing handlers
//!
//! POST /api/orders validates the card configuration, opens a payment
//! intent for the computed total, and persists the order with its moves
//! and optional artwork. Moves and artwork are best-effort writes: a
//! failure there is recorded on the order row but the submission still
//! succeeds, since the payment intent and order already exist.
//!
//! GET /api/orders returns the caller's orders with nested moves and
//! images, newest first.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, LoaderTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::AuthUser;
use crate::entities::{order_images, order_moves, orders, prelude::*};
use crate::models::order::{
    CreateOrderRequest, CreateOrderResponse, ErrorResponse, ImageFileInput, ListOrdersResponse,
    OrderDetails,
};
use crate::AppState;

/// Max moves per card, matching the four slots the card layout offers
const MAX_MOVES: usize = 4;

/// Max length for name-like fields (card type, element, name, rarity, move names)
const MAX_FIELD_LENGTH: usize = 64;

/// Max length for the HP stat, matching its column width
const MAX_HP_LENGTH: usize = 8;

/// Max length for the personalization message
const MAX_MESSAGE_LENGTH: usize = 500;

/// Max length for the AI art prompt
const MAX_PROMPT_LENGTH: usize = 500;

/// Max length for the damage annotation on a move
const MAX_DAMAGE_LENGTH: usize = 16;

/// Submit a custom card order
///
/// POST /api/orders
///
/// Steps run in order: validate, open payment intent, insert order,
/// then best-effort moves and artwork. The payment intent failing or
/// the order insert failing aborts with 500; later steps only mark
/// their outcome on the order row.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<CreateOrderResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(payload) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid request body: {}", rejection.body_text()),
            }),
        )
    })?;

    validate_create_order_request(&payload)?;

    let total_amount = state.config.base_price_cents
        + if payload.use_ai {
            state.config.ai_addon_price_cents
        } else {
            0
        };

    info!(
        user_id = %user.id,
        pokemon_name = %payload.pokemon_name,
        use_ai = payload.use_ai,
        total_amount = total_amount,
        "Order submission received"
    );

    let intent = state
        .payment
        .create_payment_intent(
            i64::from(total_amount),
            user.id,
            &payload.pokemon_name,
            &payload.card_type,
        )
        .await
        .map_err(|e| {
            error!(user_id = %user.id, error = %e, "Payment intent creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
        })?;

    let order = orders::ActiveModel {
        user_id: Set(user.id),
        stripe_payment_intent_id: Set(intent.id.clone()),
        card_type: Set(payload.card_type.clone()),
        element: Set(payload.element.clone()),
        pokemon_name: Set(payload.pokemon_name.clone()),
        hp: Set(payload.hp.clone()),
        rarity: Set(payload.rarity.clone()),
        status: Set("pending".to_string()),
        personal_message: Set(payload.personal_message.clone()),
        use_ai: Set(payload.use_ai),
        ai_prompt: Set(payload.ai_prompt.clone()),
        total_amount: Set(total_amount),
        ..Default::default()
    };

    // The payment intent stays open if this insert fails; there is no
    // compensating cancellation, the intent simply expires unconfirmed.
    let order = order.insert(&state.db).await.map_err(|e| {
        error!(user_id = %user.id, error = %e, "Order creation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to create order".to_string(),
            }),
        )
    })?;

    let mut line_items_persisted: Option<bool> = None;
    if !payload.moves.is_empty() {
        let moves: Vec<order_moves::ActiveModel> = payload
            .moves
            .iter()
            .enumerate()
            .map(|(index, mv)| order_moves::ActiveModel {
                order_id: Set(order.id),
                name: Set(mv.name.clone()),
                damage: Set(mv.damage.clone()),
                description: Set(mv.description.clone()),
                move_order: Set(index as i32),
                ..Default::default()
            })
            .collect();

        match OrderMoves::insert_many(moves).exec(&state.db).await {
            Ok(_) => line_items_persisted = Some(true),
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Moves insertion failed");
                line_items_persisted = Some(false);
            }
        }
    }

    let mut image_persisted: Option<bool> = None;
    if let Some(image) = &payload.image_file {
        image_persisted = Some(persist_order_image(&state, user.id, order.id, image).await);
    }

    // Both flags start NULL; recording them makes partial writes
    // observable for reconciliation instead of only leaving a log line.
    if line_items_persisted.is_some() || image_persisted.is_some() {
        let flags = orders::ActiveModel {
            id: Set(order.id),
            line_items_persisted: Set(line_items_persisted),
            image_persisted: Set(image_persisted),
            ..Default::default()
        };
        if let Err(e) = flags.update(&state.db).await {
            warn!(order_id = %order.id, error = %e, "Failed to record persistence flags");
        }
    }

    info!(
        order_id = %order.id,
        user_id = %user.id,
        payment_intent_id = %intent.id,
        "Order created"
    );

    Ok(Json(CreateOrderResponse {
        order_id: order.id,
        client_secret: intent.client_secret,
    }))
}

/// Uploads the artwork and records its locator. Returns whether both
/// steps succeeded; failures are logged and absorbed.
async fn persist_order_image(
    state: &AppState,
    user_id: uuid::Uuid,
    order_id: uuid::Uuid,
    image: &ImageFileInput,
) -> bool {
    let bytes = match STANDARD.decode(&image.data) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(order_id = %order_id, error = %e, "Image payload is not valid base64");
            return false;
        }
    };
    let file_size = bytes.len() as i64;

    let file_path = format!(
        "{}/{}/{}-{}",
        user_id,
        order_id,
        Utc::now().timestamp_millis(),
        image.name
    );

    if let Err(e) = state
        .storage
        .upload(&file_path, &image.content_type, bytes)
        .await
    {
        warn!(order_id = %order_id, error = %e, "Image upload failed");
        return false;
    }

    let image_row = order_images::ActiveModel {
        order_id: Set(order_id),
        file_path: Set(file_path),
        file_name: Set(image.name.clone()),
        file_size: Set(Some(file_size)),
        ..Default::default()
    };

    if let Err(e) = image_row.insert(&state.db).await {
        warn!(order_id = %order_id, error = %e, "Image row insertion failed");
        return false;
    }

    true
}

/// List the caller's orders
///
/// GET /api/orders
///
/// Returns every order owned by the caller, newest first, each with its
/// moves (in move_order position) and images.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ListOrdersResponse>, (StatusCode, Json<ErrorResponse>)> {
    let fetch_failed = |e: sea_orm::DbErr| {
        error!(user_id = %user.id, error = %e, "Orders fetch failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to fetch orders".to_string(),
            }),
        )
    };

    let order_rows = Orders::find()
        .filter(orders::Column::UserId.eq(user.id))
        .order_by_desc(orders::Column::CreatedAt)
        .all(&state.db)
        .await
        .map_err(fetch_failed)?;

    let moves = order_rows
        .load_many(OrderMoves, &state.db)
        .await
        .map_err(fetch_failed)?;
    let images = order_rows
        .load_many(OrderImages, &state.db)
        .await
        .map_err(fetch_failed)?;

    let orders = order_rows
        .into_iter()
        .zip(moves)
        .zip(images)
        .map(|((order, mut order_moves), order_images)| {
            order_moves.sort_by_key(|mv| mv.move_order);
            OrderDetails {
                order,
                order_moves,
                order_images,
            }
        })
        .collect();

    Ok(Json(ListOrdersResponse { orders }))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Validate CreateOrderRequest
fn validate_create_order_request(
    req: &CreateOrderRequest,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let required = [
        (&req.card_type, "Card type"),
        (&req.element, "Element"),
        (&req.pokemon_name, "Pokemon name"),
        (&req.hp, "HP"),
        (&req.rarity, "Rarity"),
    ];

    for (value, label) in required {
        if value.trim().is_empty() {
            return Err(bad_request(format!("{} is required", label)));
        }
        if value.len() > MAX_FIELD_LENGTH {
            return Err(bad_request(format!(
                "{} cannot exceed {} characters",
                label, MAX_FIELD_LENGTH
            )));
        }
    }

    if !req.hp.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad_request("HP must be a number"));
    }

    if req.hp.len() > MAX_HP_LENGTH {
        return Err(bad_request(format!(
            "HP cannot exceed {} characters",
            MAX_HP_LENGTH
        )));
    }

    if req.moves.len() > MAX_MOVES {
        return Err(bad_request(format!(
            "A card can have at most {} moves",
            MAX_MOVES
        )));
    }

    for mv in &req.moves {
        if mv.name.trim().is_empty() {
            return Err(bad_request("Move name is required"));
        }
        if mv.name.len() > MAX_FIELD_LENGTH {
            return Err(bad_request(format!(
                "Move name cannot exceed {} characters",
                MAX_FIELD_LENGTH
            )));
        }
        if mv.damage.trim().is_empty() {
            return Err(bad_request("Move damage is required"));
        }
        if mv.damage.len() > MAX_DAMAGE_LENGTH {
            return Err(bad_request(format!(
                "Move damage cannot exceed {} characters",
                MAX_DAMAGE_LENGTH
            )));
        }
    }

    if let Some(message) = &req.personal_message {
        if message.len() > MAX_MESSAGE_LENGTH {
            return Err(bad_request(format!(
                "Personal message cannot exceed {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }
    }

    if let Some(prompt) = &req.ai_prompt {
        if prompt.len() > MAX_PROMPT_LENGTH {
            return Err(bad_request(format!(
                "AI prompt cannot exceed {} characters",
                MAX_PROMPT_LENGTH
            )));
        }
    }

    if let Some(image) = &req.image_file {
        if image.name.trim().is_empty() {
            return Err(bad_request("Image file name is required"));
        }
        if !image.content_type.starts_with("image/") {
            return Err(bad_request("Image content type must be an image format"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::MoveInput;

    fn make_request() -> CreateOrderRequest {
        CreateOrderRequest {
            card_type: "Pokemon".to_string(),
            element: "Fire".to_string(),
            pokemon_name: "Emberclaw".to_string(),
            hp: "120".to_string(),
            rarity: "Rare".to_string(),
            moves: vec![MoveInput {
                name: "Flame Burst".to_string(),
                damage: "60".to_string(),
                description: None,
            }],
            personal_message: None,
            use_ai: false,
            ai_prompt: None,
            image_file: None,
        }
    }

    #[test]
    fn test_validate_accepts_valid_request() {
        assert!(validate_create_order_request(&make_request()).is_ok());
    }

    #[test]
    fn test_validate_accepts_no_moves() {
        let mut req = make_request();
        req.moves.clear();
        assert!(validate_create_order_request(&req).is_ok());
    }

    #[test]
    fn test_validate_pokemon_name_empty() {
        let mut req = make_request();
        req.pokemon_name = "  ".to_string();
        let result = validate_create_order_request(&req);
        assert!(result.is_err());
        let (status, body) = result.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Pokemon name is required");
    }

    #[test]
    fn test_validate_field_too_long() {
        let mut req = make_request();
        req.rarity = "R".repeat(MAX_FIELD_LENGTH + 1);
        assert!(validate_create_order_request(&req).is_err());
    }

    #[test]
    fn test_validate_hp_not_numeric() {
        let mut req = make_request();
        req.hp = "12O".to_string();
        let result = validate_create_order_request(&req);
        assert!(result.is_err());
        let (_, body) = result.unwrap_err();
        assert_eq!(body.error, "HP must be a number");
    }

    #[test]
    fn test_validate_hp_too_long() {
        let mut req = make_request();
        req.hp = "123456789".to_string();
        let result = validate_create_order_request(&req);
        assert!(result.is_err());
        let (status, body) = result.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "HP cannot exceed 8 characters");
    }

    #[test]
    fn test_validate_hp_at_limit_allowed() {
        let mut req = make_request();
        req.hp = "12345678".to_string();
        assert!(validate_create_order_request(&req).is_ok());
    }

    #[test]
    fn test_validate_too_many_moves() {
        let mut req = make_request();
        let mv = req.moves[0].clone();
        req.moves = vec![mv.clone(), mv.clone(), mv.clone(), mv.clone(), mv];
        let result = validate_create_order_request(&req);
        assert!(result.is_err());
        let (status, body) = result.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "A card can have at most 4 moves");
    }

    #[test]
    fn test_validate_four_moves_allowed() {
        let mut req = make_request();
        let mv = req.moves[0].clone();
        req.moves = vec![mv.clone(), mv.clone(), mv.clone(), mv];
        assert!(validate_create_order_request(&req).is_ok());
    }

    #[test]
    fn test_validate_move_missing_damage() {
        let mut req = make_request();
        req.moves[0].damage = String::new();
        let result = validate_create_order_request(&req);
        assert!(result.is_err());
        let (_, body) = result.unwrap_err();
        assert_eq!(body.error, "Move damage is required");
    }

    #[test]
    fn test_validate_non_image_content_type() {
        let mut req = make_request();
        req.image_file = Some(ImageFileInput {
            name: "art.png".to_string(),
            content_type: "application/pdf".to_string(),
            data: String::new(),
        });
        assert!(validate_create_order_request(&req).is_err());
    }
}

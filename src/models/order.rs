//! Order submission and listing models
//!
//! Wire shapes for POST /api/orders and GET /api/orders. Request bodies
//! arrive camelCase from the web client and are rejected outright when
//! they carry unknown fields; listing responses echo datastore rows with
//! their nested moves and images.

use serde::{Deserialize, Serialize};

use crate::entities::{order_images, order_moves, orders};

/// One move to print on the card, at most four per order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveInput {
    pub name: String,
    /// Damage value as the client renders it (e.g. "60", "120+")
    pub damage: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Reference artwork uploaded with the order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImageFileInput {
    /// Original filename, kept for display
    pub name: String,
    pub content_type: String,
    /// Base64-encoded file bytes
    pub data: String,
}

/// Request to submit a custom card order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub card_type: String,
    pub element: String,
    pub pokemon_name: String,
    /// Health stat as printed on the card, digits only
    pub hp: String,
    pub rarity: String,
    #[serde(default)]
    pub moves: Vec<MoveInput>,
    #[serde(default)]
    pub personal_message: Option<String>,
    /// Adds the AI-artwork surcharge to the total when set
    #[serde(rename = "useAI", default)]
    pub use_ai: bool,
    #[serde(default)]
    pub ai_prompt: Option<String>,
    #[serde(default)]
    pub image_file: Option<ImageFileInput>,
}

/// Returned on successful submission; the client confirms payment
/// against the secret
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: uuid::Uuid,
    pub client_secret: String,
}

/// One order with its nested line items and images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: orders::Model,
    pub order_moves: Vec<order_moves::Model>,
    pub order_images: Vec<order_images::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

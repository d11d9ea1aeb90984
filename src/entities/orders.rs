//! SeaORM Entity for orders
//!
//! One row per submitted custom card order, keyed to the paying user
//! and to the payment intent opened for it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// Payment processor intent id ("pi_..."), unique per order
    pub stripe_payment_intent_id: String,
    pub card_type: String,
    pub element: String,
    pub pokemon_name: String,
    pub hp: String,
    pub rarity: String,
    /// Lifecycle: pending -> paid -> processing -> completed | cancelled
    pub status: String,
    pub personal_message: Option<String>,
    pub use_ai: bool,
    pub ai_prompt: Option<String>,
    /// Total charged, in cents
    pub total_amount: i32,
    /// None when the order had no moves; Some(false) when the insert failed
    pub line_items_persisted: Option<bool>,
    /// None when the order had no image; Some(false) when upload or insert failed
    pub image_persisted: Option<bool>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::auth_users::Entity",
        from = "Column::UserId",
        to = "super::auth_users::Column::Id"
    )]
    AuthUsers,
    #[sea_orm(has_many = "super::order_images::Entity")]
    OrderImages,
    #[sea_orm(has_many = "super::order_moves::Entity")]
    OrderMoves,
}

impl Related<super::auth_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthUsers.def()
    }
}

impl Related<super::order_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderImages.def()
    }
}

impl Related<super::order_moves::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderMoves.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

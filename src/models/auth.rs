//! Registration and login models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::auth_users;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account as returned to clients, without the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub email_verified: Option<chrono::DateTime<chrono::FixedOffset>>,
    pub provider: String,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<auth_users::Model> for UserResponse {
    fn from(user: auth_users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
            email_verified: user.email_verified,
            provider: user.provider,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Returned on login; the token goes in the Authorization header of
/// subsequent requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

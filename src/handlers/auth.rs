//! Registration and login handlers
//!
//! POST /api/register creates an account in auth_users with a bcrypt
//! password hash. POST /api/auth/login verifies credentials and issues
//! a session token. Wrong email and wrong password are deliberately
//! indistinguishable in the login response.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{hash_password, issue_token, verify_password};
use crate::entities::{auth_users, prelude::*};
use crate::models::auth::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserResponse,
};
use crate::models::order::ErrorResponse;
use crate::AppState;

/// Minimum password length in characters
const MIN_PASSWORD_LENGTH: usize = 8;

/// Register a new account
///
/// POST /api/register
///
/// Field and password-length checks run before any hashing or datastore
/// call; a duplicate email is reported as 409 without inserting.
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(payload) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid request body: {}", rejection.body_text()),
            }),
        )
    })?;

    validate_register_request(&payload)?;

    let existing = AuthUsers::find()
        .filter(auth_users::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Existing-user check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to check existing user".to_string(),
                }),
            )
        })?;

    if existing.is_some() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "User with this email already exists".to_string(),
            }),
        ));
    }

    let hashed_password = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }),
        )
    })?;

    let user = auth_users::ActiveModel {
        name: Set(format!(
            "{} {}",
            payload.first_name.trim(),
            payload.last_name.trim()
        )),
        email: Set(payload.email.clone()),
        password: Set(hashed_password),
        ..Default::default()
    };

    let user = user.insert(&state.db).await.map_err(|e| {
        error!(error = %e, "User creation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to create user: {}", e),
            }),
        )
    })?;

    info!(user_id = %user.id, "User registered");

    Ok(Json(RegisterResponse {
        message: "User created successfully".to_string(),
        user: UserResponse::from(user),
    }))
}

/// Log in with email and password
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(payload) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid request body: {}", rejection.body_text()),
            }),
        )
    })?;

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Email and password are required".to_string(),
            }),
        ));
    }

    let user = AuthUsers::find()
        .filter(auth_users::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Login lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
        })?;

    let Some(user) = user else {
        warn!("Login attempt for unknown email");
        return Err(invalid_credentials());
    };

    if !verify_password(&payload.password, &user.password) {
        warn!(user_id = %user.id, "Login attempt with wrong password");
        return Err(invalid_credentials());
    }

    let token = issue_token(user.id, &user.email, &state.config.jwt_secret).map_err(|e| {
        error!(user_id = %user.id, error = %e, "Token issuance failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }),
        )
    })?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

fn invalid_credentials() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid email or password".to_string(),
        }),
    )
}

/// Validate RegisterRequest
fn validate_register_request(
    req: &RegisterRequest,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let all_present = !req.first_name.trim().is_empty()
        && !req.last_name.trim().is_empty()
        && !req.email.trim().is_empty()
        && !req.password.is_empty();

    if !all_present {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "All fields are required".to_string(),
            }),
        ));
    }

    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Password must be at least 8 characters long".to_string(),
            }),
        ));
    }

    Ok(())
}

// src/lib.rs

use config::AppConfig;
use sea_orm::DatabaseConnection;
use services::{payment::PaymentService, storage::StorageService};

/// Shared application state, handed to the router behind an `Arc`.
pub struct AppState {
    pub db: DatabaseConnection,
    pub payment: PaymentService,
    pub storage: StorageService,
    pub config: AppConfig,
}

pub mod entities {
    pub mod prelude;
    pub mod auth_users;
    pub mod order_images;
    pub mod order_moves;
    pub mod orders;
}

pub mod services {
    pub mod payment;
    pub mod storage;
}

pub mod auth;
pub mod config;
pub mod models;
pub mod handlers;

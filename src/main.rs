use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::env;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pokeprint_backend::config::AppConfig;
use pokeprint_backend::handlers;
use pokeprint_backend::services::{payment::PaymentService, storage::StorageService};
use pokeprint_backend::AppState;

/// Request body cap, sized for base64-encoded artwork uploads (12 MB)
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pokeprint_backend=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let stripe_secret_key = env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY must be set");
    let stripe_api_base =
        env::var("STRIPE_API_BASE").unwrap_or_else(|_| "https://api.stripe.com".to_string());
    let payment = PaymentService::new(stripe_secret_key, stripe_api_base);

    let storage_url = env::var("STORAGE_URL").expect("STORAGE_URL must be set");
    let storage_service_key =
        env::var("STORAGE_SERVICE_KEY").expect("STORAGE_SERVICE_KEY must be set");
    let storage_bucket =
        env::var("STORAGE_BUCKET").unwrap_or_else(|_| "order-images".to_string());
    let storage = StorageService::new(storage_service_key, storage_url, storage_bucket);

    let state = Arc::new(AppState {
        db,
        payment,
        storage,
        config: AppConfig::from_env(),
    });

    // Build router
    let app = Router::new()
        .route("/", get(hello_pokeprint))
        .route(
            "/api/orders",
            post(handlers::order::create_order).get(handlers::order::list_orders),
        )
        .route("/api/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/webhooks/stripe", post(handlers::webhook::stripe_webhook))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn hello_pokeprint() -> &'static str {
    "Poke Print Me API"
}

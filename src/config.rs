//! Runtime configuration shared with request handlers.
//!
//! Values needed at request time live here; connection strings and
//! service credentials are read once in main and handed to the
//! services that own them.

use std::env;

/// Base price of a custom card in cents ($34.98)
const DEFAULT_BASE_PRICE_CENTS: i32 = 3498;

/// Surcharge for AI-generated artwork in cents ($9.99)
const DEFAULT_AI_ADDON_PRICE_CENTS: i32 = 999;

#[derive(Clone)]
pub struct AppConfig {
    /// HMAC key for signing session tokens
    pub jwt_secret: String,
    /// Shared secret for verifying payment webhook signatures
    pub stripe_webhook_secret: String,
    pub base_price_cents: i32,
    pub ai_addon_price_cents: i32,
}

impl AppConfig {
    /// Reads configuration from the environment. Panics when a required
    /// variable is missing, so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        let stripe_webhook_secret =
            env::var("STRIPE_WEBHOOK_SECRET").expect("STRIPE_WEBHOOK_SECRET must be set");

        let base_price_cents = env::var("BASE_PRICE_CENTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BASE_PRICE_CENTS);
        let ai_addon_price_cents = env::var("AI_ADDON_PRICE_CENTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_AI_ADDON_PRICE_CENTS);

        Self {
            jwt_secret,
            stripe_webhook_secret,
            base_price_cents,
            ai_addon_price_cents,
        }
    }
}

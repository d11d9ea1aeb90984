pub mod auth;
pub mod order;

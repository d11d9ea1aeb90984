pub mod auth;
pub mod order;
pub mod webhook;

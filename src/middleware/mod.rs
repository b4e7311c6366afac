//! Axum middleware

pub mod auth;
pub mod rate_limit;

pub use auth::{ApiKeys, RequireAuth};
pub use rate_limit::{RateLimitLayer, RateLimitSettings};

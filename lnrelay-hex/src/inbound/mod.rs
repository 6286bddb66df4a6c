//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the application layer.

mod auth;
mod handlers;
mod rate_limit;
mod server;

pub use auth::ApiKeyAuth;
pub use handlers::{ApiError, AppState};
pub use rate_limit::RateLimiterState;
pub use server::HttpServer;

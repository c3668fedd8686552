//! Application state management.
//!
//! The state contains:
//! - Configuration
//! - The PostgreSQL connection pool
//! - The token service shared by every authenticated router

use axum_helpers::TokenService;

/// Shared application state.
///
/// Cloned into routers at startup; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: database::postgres::DatabaseConnection,
    /// Signs and verifies access and refresh tokens
    pub tokens: TokenService,
}

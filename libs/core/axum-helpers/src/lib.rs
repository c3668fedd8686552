//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! ## Modules
//!
//! - **[`auth`]**: password hashing, access/refresh JWTs, the typed [`Principal`], authentication and role gates
//! - **[`server`]**: router assembly, health checks, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`errors`]**: structured error responses with stable error codes
//! - **[`extractors`]**: UUID path and validated JSON extractors
//! - **[`audit`]**: audit logging for security-relevant events
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//!
//! let router = create_router::<ApiDoc>(api_routes)?.merge(health_router(app_info!()));
//! create_production_app(router, &config.server, Duration::from_secs(30), async {}).await?;
//! ```

pub mod audit;
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{
    AccessClaims, AllowedRoles, PasswordError, Principal, RefreshClaims, TokenError, TokenService,
    TokenType, authenticate, authenticate_staff, authorize, hash_password, verify_password,
    verify_password_or_dummy,
};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, close_postgres, create_production_app,
    create_router, health_router, run_health_checks, shutdown_signal,
};

pub use http::{create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{UuidPath, UuidPathPair, ValidatedJson};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};

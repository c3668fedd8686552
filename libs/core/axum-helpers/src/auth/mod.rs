//! Authentication and authorization.
//!
//! - [`hash_password`] / [`verify_password`]: Argon2id credential hashing
//! - [`TokenService`]: signs and verifies access and refresh JWTs with separate secrets
//! - [`Principal`]: typed caller identity, available to handlers as an extractor
//! - [`authenticate`] / [`authenticate_staff`] / [`authorize`]: route-group gates
//!
//! # Example
//!
//! ```ignore
//! use axum::middleware::from_fn_with_state;
//! use axum_helpers::auth::{AllowedRoles, TokenService, authenticate, authorize};
//!
//! let tokens = TokenService::new(&auth_config);
//!
//! let admin_routes = Router::new()
//!     .route("/users", get(list_users))
//!     .layer(from_fn_with_state(AllowedRoles(&["admin"]), authorize))
//!     .layer(from_fn_with_state(tokens.clone(), authenticate));
//! ```

pub mod middleware;
pub mod password;
pub mod principal;
pub mod tokens;

pub use middleware::{AllowedRoles, authenticate, authenticate_staff, authorize};
pub use password::{PasswordError, hash_password, verify_password, verify_password_or_dummy};
pub use principal::{Principal, TokenType};
pub use tokens::{AccessClaims, RefreshClaims, TokenError, TokenService};

use crate::errors::AppError;

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            TokenError::Signing(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

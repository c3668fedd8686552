//! Type-safe error codes for API responses.
//!
//! Single source of truth for the error taxonomy. Each code carries:
//! - String representation for clients (e.g., "VALIDATION_ERROR")
//! - Integer code for logging and monitoring (e.g., 1001)
//! - Default human-readable message
//! - The HTTP status it maps to
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::InvalidCredentials;
//! assert_eq!(code.as_str(), "INVALID_CREDENTIALS");
//! assert_eq!(code.code(), 1011);
//! assert_eq!(code.status_code().as_u16(), 401);
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// Request validation failed
    ValidationError,

    /// Invalid UUID format in path or query parameter
    InvalidUuid,

    /// JSON extraction from request body failed
    JsonExtraction,

    /// Requested resource was not found, or is not owned by the caller
    NotFound,

    /// An unexpected internal server error occurred
    InternalError,

    /// Authentication credentials are missing or invalid
    Unauthorized,

    /// Authenticated principal lacks the required role
    Forbidden,

    /// Request conflicts with an existing resource
    Conflict,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// An account with this identity already exists
    DuplicateIdentity,

    /// Login failed; deliberately does not say which part was wrong
    InvalidCredentials,

    /// Refresh token is unknown, rotated away, expired or badly signed
    InvalidRefreshToken,

    /// Store id or slug did not resolve to a store
    InvalidStoreId,

    /// Staff account is deactivated
    AccountInactive,

    // Database errors (2000-2999)
    /// Database connection or query error
    DatabaseError,
}

impl ErrorCode {
    /// SCREAMING_SNAKE_CASE identifier clients can match on.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidUuid => "INVALID_UUID",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::DuplicateIdentity => "DUPLICATE_IDENTITY",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::InvalidStoreId => "INVALID_STORE_ID",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }

    /// Integer code for structured logs and metrics.
    ///
    /// - 1000-1999: Client and auth errors
    /// - 2000-2999: Database errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidUuid => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Unauthorized => 1006,
            Self::Forbidden => 1007,
            Self::Conflict => 1008,
            Self::ServiceUnavailable => 1009,
            Self::DuplicateIdentity => 1010,
            Self::InvalidCredentials => 1011,
            Self::InvalidRefreshToken => 1012,
            Self::InvalidStoreId => 1013,
            Self::AccountInactive => 1014,

            Self::DatabaseError => 2001,
        }
    }

    /// Default user-facing message. Handlers may override it with something more specific.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidUuid => "Invalid UUID format",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::InternalError => "An internal server error occurred",
            Self::Unauthorized => "Authentication required",
            Self::Forbidden => "Access forbidden",
            Self::Conflict => "Resource already exists",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::DuplicateIdentity => "An account with this email already exists",
            Self::InvalidCredentials => "Invalid credentials",
            Self::InvalidRefreshToken => "Invalid refresh token",
            Self::InvalidStoreId => "Invalid store ID",
            Self::AccountInactive => "Account is inactive",
            Self::DatabaseError => "A database error occurred",
        }
    }

    /// HTTP status this code is rendered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError | Self::InvalidUuid | Self::JsonExtraction => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized
            | Self::InvalidCredentials
            | Self::InvalidRefreshToken
            | Self::InvalidStoreId
            | Self::AccountInactive => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict | Self::DuplicateIdentity => StatusCode::CONFLICT,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Server-side failures whose detail must not reach the client.
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error() && *self != Self::ServiceUnavailable
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

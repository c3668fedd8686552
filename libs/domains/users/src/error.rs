use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode, PasswordError, TokenError};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid old password")]
    InvalidOldPassword,

    #[error("Admin accounts cannot be deleted")]
    AdminProtected,

    #[error(transparent)]
    PasswordHash(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

/// Failures of the owner-side session flows (register, login, refresh).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email '{0}' is already registered")]
    DuplicateIdentity(String),

    /// Unknown email or wrong password; the two are never told apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad signature, expired, unknown or already rotated away.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error(transparent)]
    User(#[from] UserError),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => AppError::NotFound("User not found".to_string()),
            UserError::DuplicateEmail(_) => AppError::coded(ErrorCode::DuplicateIdentity),
            UserError::InvalidOldPassword => AppError::Coded {
                code: ErrorCode::ValidationError,
                message: "Invalid old password".to_string(),
            },
            UserError::AdminProtected => {
                AppError::Forbidden("Cannot delete an admin".to_string())
            }
            UserError::PasswordHash(e) => AppError::InternalServerError(e.to_string()),
            UserError::Internal(msg) => AppError::InternalServerError(msg),
            UserError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DuplicateIdentity(_) => AppError::coded(ErrorCode::DuplicateIdentity),
            AuthError::InvalidCredentials => AppError::coded(ErrorCode::InvalidCredentials),
            AuthError::InvalidRefreshToken => AppError::coded(ErrorCode::InvalidRefreshToken),
            AuthError::Token(e) => e.into(),
            AuthError::User(e) => e.into(),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

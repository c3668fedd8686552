use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode, PasswordError, TokenError};
use domain_stores::StoreError;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StaffError {
    #[error("Staff not found: {0}")]
    NotFound(Uuid),

    /// `staff_id` is unique per store, not globally
    #[error("Staff ID '{0}' already exists in this store")]
    DuplicateStaffId(String),

    #[error("Store reference did not resolve")]
    InvalidStoreId,

    /// Unknown staff id or wrong password; the two are never told apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error(transparent)]
    PasswordHash(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type StaffResult<T> = Result<T, StaffError>;

impl From<StaffError> for AppError {
    fn from(err: StaffError) -> Self {
        match err {
            StaffError::NotFound(_) => AppError::NotFound("Staff not found".to_string()),
            StaffError::DuplicateStaffId(_) => {
                AppError::Conflict("Staff ID already exists in this store".to_string())
            }
            StaffError::InvalidStoreId => AppError::coded(ErrorCode::InvalidStoreId),
            StaffError::InvalidCredentials => AppError::coded(ErrorCode::InvalidCredentials),
            StaffError::AccountInactive => AppError::coded(ErrorCode::AccountInactive),
            StaffError::Store(e) => e.into(),
            StaffError::Token(e) => e.into(),
            StaffError::PasswordHash(e) => AppError::InternalServerError(e.to_string()),
            StaffError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for StaffError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

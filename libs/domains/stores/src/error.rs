use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or owned by someone else; the two are never told apart.
    #[error("Store not found: {0}")]
    NotFound(Uuid),

    #[error("Slug '{0}' is already taken")]
    SlugTaken(String),

    #[error("Could not generate a free slug after {0} attempts")]
    SlugExhausted(usize),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound("Store not found".to_string()),
            StoreError::SlugTaken(_) => AppError::Conflict("Slug is already taken".to_string()),
            StoreError::SlugExhausted(attempts) => AppError::InternalServerError(format!(
                "slug generation failed after {} attempts",
                attempts
            )),
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_helpers::ErrorCode;

    #[test]
    fn test_store_error_statuses() {
        let code = |e: StoreError| AppError::from(e).code();
        assert_eq!(code(StoreError::NotFound(Uuid::nil())), ErrorCode::NotFound);
        assert_eq!(code(StoreError::SlugTaken("abc123".into())), ErrorCode::Conflict);
        assert_eq!(
            code(StoreError::SlugExhausted(5)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

//! UUID path parameter extractor with automatic validation.

use crate::errors::{AppError, ErrorCode};
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Extractor for a single UUID path parameter.
///
/// A malformed id is rejected with `INVALID_UUID` before the handler runs.
///
/// # Example
/// ```ignore
/// async fn get_user(UuidPath(id): UuidPath) -> String {
///     format!("User ID: {}", id)
/// }
///
/// let app = Router::new().route("/users/{id}", get(get_user));
/// ```
pub struct UuidPath(pub Uuid);

impl<S> FromRequestParts<S> for UuidPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        parse(&id).map(UuidPath)
    }
}

/// Extractor for two UUID path parameters, in route order.
///
/// ```ignore
/// async fn get_staff(UuidPathPair(store_id, staff_id): UuidPathPair) { ... }
///
/// let app = Router::new().route("/stores/{store_id}/staff/{staff_id}", get(get_staff));
/// ```
pub struct UuidPathPair(pub Uuid, pub Uuid);

impl<S> FromRequestParts<S> for UuidPathPair
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((first, second)) = Path::<(String, String)>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        Ok(UuidPathPair(parse(&first)?, parse(&second)?))
    }
}

fn parse(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| {
        AppError::Coded {
            code: ErrorCode::InvalidUuid,
            message: format!("Invalid UUID: {}", id),
        }
        .into_response()
    })
}

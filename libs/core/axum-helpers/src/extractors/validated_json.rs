//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Deserializes the body, then runs `Validate`. Failures become
/// `JSON_EXTRACTION` or `VALIDATION_ERROR` responses with field-level details.
///
/// # Example
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CreateStore {
///     #[validate(length(min = 3, max = 50))]
///     name: String,
/// }
///
/// async fn create_store(ValidatedJson(payload): ValidatedJson<CreateStore>) -> String {
///     format!("Creating store: {}", payload.name)
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}

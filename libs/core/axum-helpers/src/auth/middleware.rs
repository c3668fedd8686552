use super::principal::{Principal, TokenType};
use super::tokens::TokenService;
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

/// Roles accepted by [`authorize`].
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [&'static str]);

impl AllowedRoles {
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(&role)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .filter(|token| !token.is_empty())
}

fn resolve(
    tokens: &TokenService,
    headers: &HeaderMap,
    expected: TokenType,
) -> Result<Principal, AppError> {
    let token = bearer_token(headers).ok_or_else(|| {
        tracing::debug!("No bearer token in Authorization header");
        AppError::Unauthorized("Authentication required".to_string())
    })?;

    let claims = tokens
        .verify_access_token(&token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    if claims.token_type != expected {
        tracing::debug!(
            token_type = ?claims.token_type,
            expected = ?expected,
            "Access token presented to the wrong route group"
        );
        return Err(AppError::Unauthorized(
            "Invalid or expired token".to_string(),
        ));
    }

    Principal::try_from(claims)
}

/// Owner-user authentication.
///
/// Requires `Authorization: Bearer <access token>` signed with the access
/// secret and issued to an owner. Inserts the [`Principal`] into request
/// extensions on success.
///
/// ```ignore
/// let protected = Router::new()
///     .route("/me", get(me))
///     .layer(axum::middleware::from_fn_with_state(tokens.clone(), authenticate));
/// ```
pub async fn authenticate(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve(&tokens, request.headers(), TokenType::Owner) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Staff authentication. Same as [`authenticate`] but only accepts
/// store-scoped staff tokens.
pub async fn authenticate_staff(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve(&tokens, request.headers(), TokenType::Staff) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Role gate. Must be layered inside (after) an authentication layer:
///
/// ```ignore
/// Router::new()
///     .route("/", get(list_users))
///     .layer(from_fn_with_state(AllowedRoles(&["admin"]), authorize))
///     .layer(from_fn_with_state(tokens, authenticate));
/// ```
pub async fn authorize(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Response {
    let Some(principal) = request.extensions().get::<Principal>() else {
        return AppError::Unauthorized("Authentication required".to_string()).into_response();
    };

    if !allowed.contains(&principal.role) {
        tracing::info!(
            subject_id = %principal.subject_id,
            role = %principal.role,
            "Role not allowed for this route"
        );
        return AppError::Forbidden("Insufficient permissions".to_string()).into_response();
    }

    next.run(request).await
}

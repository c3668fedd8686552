use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::from_fn_with_state,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_helpers::{
    AuditEvent, AuditOutcome, Principal, ValidatedJson, authenticate,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        UnauthorizedResponse,
    },
    extract_ip_from_headers,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::auth_service::AuthService;
use crate::error::{AuthError, AuthResult, UserError};
use crate::models::{
    LoginRequest, LoginResponse, MessageResponse, RefreshResponse, RegisterRequest, UserResponse,
};
use crate::refresh_token::RefreshTokenStore;
use crate::repository::UserRepository;

pub const TAG: &str = "auth";

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// The refresh cookie is only ever sent to this path
pub const REFRESH_COOKIE_PATH: &str = "/api/auth/refresh";

/// Attributes of the refresh-token cookie.
#[derive(Debug, Clone, Copy)]
pub struct RefreshCookie {
    /// Adds the `Secure` attribute
    pub secure: bool,
    pub max_age_secs: i64,
}

impl RefreshCookie {
    fn attributes(&self, max_age: i64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "HttpOnly; Path={}; Max-Age={}; SameSite=Strict{}",
            REFRESH_COOKIE_PATH, max_age, secure
        )
    }

    /// `Set-Cookie` value carrying `token`
    pub fn set(&self, token: &str) -> Result<HeaderValue, UserError> {
        let cookie = format!(
            "{}={}; {}",
            REFRESH_COOKIE,
            token,
            self.attributes(self.max_age_secs)
        );
        HeaderValue::from_str(&cookie)
            .map_err(|e| UserError::Internal(format!("Failed to create cookie: {}", e)))
    }

    /// `Set-Cookie` value that removes the refresh cookie
    pub fn clear(&self) -> Result<HeaderValue, UserError> {
        let cookie = format!("{}=; {}", REFRESH_COOKIE, self.attributes(0));
        HeaderValue::from_str(&cookie)
            .map_err(|e| UserError::Internal(format!("Failed to create cookie: {}", e)))
    }
}

/// Application state for auth handlers
pub struct AuthState<R: UserRepository, S: RefreshTokenStore> {
    pub service: Arc<AuthService<R, S>>,
    pub cookie: RefreshCookie,
}

impl<R: UserRepository, S: RefreshTokenStore> Clone for AuthState<R, S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            cookie: self.cookie,
        }
    }
}

/// OpenAPI documentation for the auth endpoints
#[derive(OpenApi)]
#[openapi(
    paths(register, login, refresh, logout, logout_all, me),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            RefreshResponse,
            MessageResponse,
            UserResponse
        ),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Owner-user registration and sessions")
    )
)]
pub struct ApiDoc;

/// Create the auth router. `/logout-all` and `/me` require an owner access token.
pub fn router<R, S>(service: AuthService<R, S>, cookie: RefreshCookie) -> Router
where
    R: UserRepository + 'static,
    S: RefreshTokenStore + 'static,
{
    let tokens = service.tokens().clone();
    let state = AuthState {
        service: Arc::new(service),
        cookie,
    };

    let protected = Router::new()
        .route("/logout-all", post(logout_all))
        .route("/me", get(me))
        .route_layer(from_fn_with_state(tokens, authenticate));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .merge(protected)
        .with_state(state)
}

/// Register a new owner-user
#[utoipa::path(
    post,
    path = "/register",
    tag = TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R: UserRepository, S: RefreshTokenStore>(
    State(state): State<AuthState<R, S>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    let user = state.service.register(input).await?;

    AuditEvent::new(
        Some(user.id.to_string()),
        "auth.register",
        Some(format!("user:{}", user.id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password
///
/// The refresh token is returned only as an HttpOnly cookie scoped to `/api/auth/refresh`.
#[utoipa::path(
    post,
    path = "/login",
    tag = TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; refresh token set as cookie", body = LoginResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository, S: RefreshTokenStore>(
    State(state): State<AuthState<R, S>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let email = input.email.clone();

    let session = match state
        .service
        .login(input, extract_ip_from_headers(&headers))
        .await
    {
        Ok(session) => session,
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                AuditEvent::new(
                    None,
                    "auth.login",
                    Some(format!("email:{}", email)),
                    AuditOutcome::Failure,
                )
                .with_request(&headers)
                .log();
            }
            return Err(e);
        }
    };

    AuditEvent::new(
        Some(session.user.id.to_string()),
        "auth.login",
        Some(format!("user:{}", session.user.id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    let cookie = state.cookie.set(&session.refresh_token)?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(LoginResponse {
            access_token: session.access_token,
            user: session.user,
        }),
    ))
}

/// Rotate the refresh token from the cookie and issue a new access token
#[utoipa::path(
    post,
    path = "/refresh",
    tag = TAG,
    responses(
        (status = 200, description = "New access token; rotated refresh cookie", body = RefreshResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn refresh<R: UserRepository, S: RefreshTokenStore>(
    State(state): State<AuthState<R, S>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse> {
    let Some(token) = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()) else {
        return Err(AuthError::InvalidRefreshToken);
    };

    let session = match state
        .service
        .refresh(&token, extract_ip_from_headers(&headers))
        .await
    {
        Ok(session) => session,
        Err(e) => {
            if matches!(e, AuthError::InvalidRefreshToken) {
                AuditEvent::new(None, "auth.refresh", None, AuditOutcome::Failure)
                    .with_request(&headers)
                    .log();
            }
            return Err(e);
        }
    };

    let cookie = state.cookie.set(&session.refresh_token)?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(RefreshResponse {
            access_token: session.access_token,
        }),
    ))
}

/// Revoke the refresh token from the cookie (if any) and clear the cookie
#[utoipa::path(
    post,
    path = "/logout",
    tag = TAG,
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn logout<R: UserRepository, S: RefreshTokenStore>(
    State(state): State<AuthState<R, S>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        state.service.logout(cookie.value()).await?;
    }

    AuditEvent::new(None, "auth.logout", None, AuditOutcome::Success)
        .with_request(&headers)
        .log();

    Ok((
        AppendHeaders([(header::SET_COOKIE, state.cookie.clear()?)]),
        Json(MessageResponse::new("Logged out successfully")),
    ))
}

/// Revoke every refresh token of the caller
#[utoipa::path(
    post,
    path = "/logout-all",
    tag = TAG,
    responses(
        (status = 200, description = "All sessions ended", body = MessageResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn logout_all<R: UserRepository, S: RefreshTokenStore>(
    State(state): State<AuthState<R, S>>,
    principal: Principal,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    let removed = state.service.logout_all(principal.subject_id).await?;

    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "auth.logout_all",
        Some(format!("user:{}", principal.subject_id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .with_details(json!({ "revoked": removed }))
    .log();

    Ok((
        AppendHeaders([(header::SET_COOKIE, state.cookie.clear()?)]),
        Json(MessageResponse::new("Logged out from all devices")),
    ))
}

/// Current owner-user
#[utoipa::path(
    get,
    path = "/me",
    tag = TAG,
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn me<R: UserRepository, S: RefreshTokenStore>(
    State(state): State<AuthState<R, S>>,
    principal: Principal,
) -> AuthResult<Json<UserResponse>> {
    Ok(Json(state.service.me(principal.subject_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = RefreshCookie {
            secure: false,
            max_age_secs: 604800,
        };
        assert_eq!(
            cookie.set("abc").unwrap(),
            "refreshToken=abc; HttpOnly; Path=/api/auth/refresh; Max-Age=604800; SameSite=Strict"
        );
        assert_eq!(
            cookie.clear().unwrap(),
            "refreshToken=; HttpOnly; Path=/api/auth/refresh; Max-Age=0; SameSite=Strict"
        );
    }

    #[test]
    fn test_secure_cookie() {
        let cookie = RefreshCookie {
            secure: true,
            max_age_secs: 60,
        };
        assert!(cookie.set("abc").unwrap().to_str().unwrap().ends_with("; Secure"));
    }
}

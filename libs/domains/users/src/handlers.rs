use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    middleware::from_fn_with_state,
    routing::{get, patch, put},
};
use axum_helpers::{
    AllowedRoles, AuditEvent, AuditOutcome, Principal, TokenService, UuidPath, ValidatedJson,
    authenticate, authorize,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{
    ChangePassword, MessageResponse, ResetPassword, UpdateAvatar, UpdateProfile, UpdateRole,
    UserResponse,
};
use crate::refresh_token::RefreshTokenStore;
use crate::repository::UserRepository;
use crate::service::UserService;

pub const TAG: &str = "users";

type SharedService<R, S> = Arc<UserService<R, S>>;

/// OpenAPI documentation for the users endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        update_profile,
        change_password,
        set_avatar,
        clear_avatar,
        delete_me,
        list_users,
        get_user,
        update_role,
        reset_password,
        delete_user,
    ),
    components(
        schemas(
            UserResponse,
            UpdateProfile,
            ChangePassword,
            UpdateAvatar,
            UpdateRole,
            ResetPassword,
            MessageResponse
        ),
        responses(
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Owner-user profile and administration")
    )
)]
pub struct ApiDoc;

/// Create the users router. Every route requires an owner access token;
/// the `/{id}` family and the listing additionally require the admin role.
pub fn router<R, S>(service: UserService<R, S>, tokens: TokenService) -> Router
where
    R: UserRepository + 'static,
    S: RefreshTokenStore + 'static,
{
    let admin = Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user).delete(delete_user))
        .route("/{id}/role", patch(update_role))
        .route("/{id}/password", patch(reset_password))
        .route_layer(from_fn_with_state(AllowedRoles(&["admin"]), authorize));

    Router::new()
        .route("/me", patch(update_profile).delete(delete_me))
        .route("/me/password", put(change_password))
        .route("/me/avatar", put(set_avatar).delete(clear_avatar))
        .merge(admin)
        .route_layer(from_fn_with_state(tokens, authenticate))
        .with_state(Arc::new(service))
}

/// Update the caller's name and/or email
#[utoipa::path(
    patch,
    path = "/me",
    tag = TAG,
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn update_profile<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
    principal: Principal,
    ValidatedJson(input): ValidatedJson<UpdateProfile>,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(
        service.update_profile(principal.subject_id, input).await?,
    ))
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/me/password",
    tag = TAG,
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn change_password<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
    principal: Principal,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ChangePassword>,
) -> UserResult<Json<MessageResponse>> {
    service
        .change_password(principal.subject_id, &input.old_password, &input.new_password)
        .await?;

    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "user.change_password",
        Some(format!("user:{}", principal.subject_id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Set the caller's avatar URL
#[utoipa::path(
    put,
    path = "/me/avatar",
    tag = TAG,
    request_body = UpdateAvatar,
    responses(
        (status = 200, description = "Avatar set", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn set_avatar<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
    principal: Principal,
    ValidatedJson(input): ValidatedJson<UpdateAvatar>,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(
        service
            .set_avatar(principal.subject_id, input.avatar_url)
            .await?,
    ))
}

/// Remove the caller's avatar
#[utoipa::path(
    delete,
    path = "/me/avatar",
    tag = TAG,
    responses(
        (status = 200, description = "Avatar cleared", body = UserResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn clear_avatar<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
    principal: Principal,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(service.clear_avatar(principal.subject_id).await?))
}

/// Delete the caller's own account
#[utoipa::path(
    delete,
    path = "/me",
    tag = TAG,
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn delete_me<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
    principal: Principal,
    headers: HeaderMap,
) -> UserResult<Json<MessageResponse>> {
    service.delete_self(principal.subject_id).await?;

    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "user.delete_self",
        Some(format!("user:{}", principal.subject_id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok(Json(MessageResponse::new("Account deleted")))
}

/// List all owner-users (admin)
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_users<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
) -> UserResult<Json<Vec<UserResponse>>> {
    Ok(Json(service.list_users().await?))
}

/// Get a user by ID (admin)
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_user<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(service.get_user(id).await?))
}

/// Change a user's role (admin)
#[utoipa::path(
    patch,
    path = "/{id}/role",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role changed", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_role<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
    principal: Principal,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    Json(input): Json<UpdateRole>,
) -> UserResult<Json<UserResponse>> {
    let user = service.update_role(id, input.role).await?;

    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "user.update_role",
        Some(format!("user:{}", id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .with_details(json!({ "role": user.role.to_string() }))
    .log();

    Ok(Json(user))
}

/// Reset a user's password (admin)
#[utoipa::path(
    patch,
    path = "/{id}/password",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ResetPassword,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn reset_password<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
    principal: Principal,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<ResetPassword>,
) -> UserResult<Json<MessageResponse>> {
    service.reset_password(id, &input.new_password).await?;

    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "user.reset_password",
        Some(format!("user:{}", id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok(Json(MessageResponse::new("Password reset successfully")))
}

/// Delete a user (admin). Admin accounts cannot be deleted.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_user<R: UserRepository, S: RefreshTokenStore>(
    State(service): State<SharedService<R, S>>,
    principal: Principal,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> UserResult<Json<MessageResponse>> {
    let result = service.delete_user(id).await;

    let outcome = if result.is_ok() {
        AuditOutcome::Success
    } else {
        AuditOutcome::Denied
    };
    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "user.delete",
        Some(format!("user:{}", id)),
        outcome,
    )
    .with_request(&headers)
    .log();

    result?;
    Ok(Json(MessageResponse::new("User deleted")))
}

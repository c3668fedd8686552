use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, Principal, TokenService, UuidPath, UuidPathPair, ValidatedJson,
    authenticate, authenticate_staff,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use domain_stores::StoreLookup;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::StaffResult;
use crate::models::{
    CreateStaff, DeleteResponse, StaffEnvelope, StaffList, StaffLoginRequest, StaffLoginResponse,
    StaffResponse, StaffRole, UpdateStaff,
};
use crate::repository::StaffRepository;
use crate::service::StaffService;

pub const TAG: &str = "staff";

type SharedService<R, L> = Arc<StaffService<R, L>>;

/// OpenAPI documentation for staff management under a store
#[derive(OpenApi)]
#[openapi(
    paths(create_staff, list_staff, update_staff, delete_staff),
    components(
        schemas(
            StaffResponse,
            StaffRole,
            CreateStaff,
            UpdateStaff,
            StaffEnvelope,
            StaffList,
            DeleteResponse
        ),
        responses(
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            NotFoundResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Staff of the caller's stores, and staff sessions")
    )
)]
pub struct ManagementApiDoc;

/// OpenAPI documentation for staff sign-in
#[derive(OpenApi)]
#[openapi(
    paths(login, me),
    components(
        schemas(StaffLoginRequest, StaffLoginResponse, StaffResponse, StaffRole),
        responses(BadRequestValidationResponse, UnauthorizedResponse)
    ),
    tags(
        (name = TAG, description = "Staff of the caller's stores, and staff sessions")
    )
)]
pub struct ApiDoc;

/// Staff management, meant to be merged into the stores router.
///
/// Requires an owner access token; the store in the path must belong to the caller.
pub fn management_router<R, L>(service: StaffService<R, L>, tokens: TokenService) -> Router
where
    R: StaffRepository + 'static,
    L: StoreLookup + 'static,
{
    Router::new()
        .route("/{store_id}/staff", get(list_staff).post(create_staff))
        .route(
            "/{store_id}/staff/{staff_id}",
            patch(update_staff).delete(delete_staff),
        )
        .route_layer(from_fn_with_state(tokens, authenticate))
        .with_state(Arc::new(service))
}

/// Staff sessions: public login plus `/me` behind a staff access token.
pub fn session_router<R, L>(service: StaffService<R, L>, tokens: TokenService) -> Router
where
    R: StaffRepository + 'static,
    L: StoreLookup + 'static,
{
    let service = Arc::new(service);

    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(from_fn_with_state(tokens, authenticate_staff))
        .with_state(service.clone());

    Router::new()
        .route("/login", post(login))
        .with_state(service)
        .merge(protected)
}

/// Add a staff member to one of the caller's stores
#[utoipa::path(
    post,
    path = "/{store_id}/staff",
    tag = TAG,
    params(("store_id" = Uuid, Path, description = "Store ID")),
    request_body = CreateStaff,
    responses(
        (status = 201, description = "Staff created", body = StaffEnvelope),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_staff<R: StaffRepository, L: StoreLookup>(
    State(service): State<SharedService<R, L>>,
    principal: Principal,
    headers: HeaderMap,
    UuidPath(store_id): UuidPath,
    ValidatedJson(input): ValidatedJson<CreateStaff>,
) -> StaffResult<impl IntoResponse> {
    let staff = service
        .create_staff(principal.subject_id, store_id, input)
        .await?;

    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "staff.create",
        Some(format!("store:{}/staff:{}", store_id, staff.id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok((
        StatusCode::CREATED,
        Json(StaffEnvelope {
            staff: staff.into(),
        }),
    ))
}

/// List the staff of one of the caller's stores
#[utoipa::path(
    get,
    path = "/{store_id}/staff",
    tag = TAG,
    params(("store_id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Staff of the store", body = StaffList),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_staff<R: StaffRepository, L: StoreLookup>(
    State(service): State<SharedService<R, L>>,
    principal: Principal,
    UuidPath(store_id): UuidPath,
) -> StaffResult<Json<StaffList>> {
    let staff = service.list_staff(principal.subject_id, store_id).await?;
    Ok(Json(StaffList {
        staff: staff.into_iter().map(Into::into).collect(),
    }))
}

/// Update a staff member
#[utoipa::path(
    patch,
    path = "/{store_id}/staff/{staff_id}",
    tag = TAG,
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("staff_id" = Uuid, Path, description = "Staff record ID")
    ),
    request_body = UpdateStaff,
    responses(
        (status = 200, description = "Staff updated", body = StaffEnvelope),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_staff<R: StaffRepository, L: StoreLookup>(
    State(service): State<SharedService<R, L>>,
    principal: Principal,
    UuidPathPair(store_id, id): UuidPathPair,
    ValidatedJson(input): ValidatedJson<UpdateStaff>,
) -> StaffResult<Json<StaffEnvelope>> {
    let staff = service
        .update_staff(principal.subject_id, store_id, id, input)
        .await?;
    Ok(Json(StaffEnvelope {
        staff: staff.into(),
    }))
}

/// Remove a staff member
#[utoipa::path(
    delete,
    path = "/{store_id}/staff/{staff_id}",
    tag = TAG,
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("staff_id" = Uuid, Path, description = "Staff record ID")
    ),
    responses(
        (status = 200, description = "Staff deleted", body = DeleteResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_staff<R: StaffRepository, L: StoreLookup>(
    State(service): State<SharedService<R, L>>,
    principal: Principal,
    headers: HeaderMap,
    UuidPathPair(store_id, id): UuidPathPair,
) -> StaffResult<Json<DeleteResponse>> {
    service
        .delete_staff(principal.subject_id, store_id, id)
        .await?;

    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "staff.delete",
        Some(format!("store:{}/staff:{}", store_id, id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok(Json(DeleteResponse { success: true }))
}

/// Staff login with a store id or slug
#[utoipa::path(
    post,
    path = "/login",
    tag = TAG,
    request_body = StaffLoginRequest,
    responses(
        (status = 200, description = "Logged in", body = StaffLoginResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn login<R: StaffRepository, L: StoreLookup>(
    State(service): State<SharedService<R, L>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<StaffLoginRequest>,
) -> StaffResult<Json<StaffLoginResponse>> {
    let resource = Some(format!("store:{}/staff:{}", input.store_id, input.staff_id));

    match service.login(input).await {
        Ok((access_token, staff)) => {
            AuditEvent::new(
                Some(staff.id.to_string()),
                "staff.login",
                resource,
                AuditOutcome::Success,
            )
            .with_request(&headers)
            .log();

            Ok(Json(StaffLoginResponse {
                access_token,
                staff: staff.into(),
            }))
        }
        Err(e) => {
            AuditEvent::new(None, "staff.login", resource, AuditOutcome::Failure)
                .with_request(&headers)
                .log();
            Err(e)
        }
    }
}

/// The staff member behind the access token
#[utoipa::path(
    get,
    path = "/me",
    tag = TAG,
    responses(
        (status = 200, description = "Current staff member", body = StaffResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn me<R: StaffRepository, L: StoreLookup>(
    State(service): State<SharedService<R, L>>,
    principal: Principal,
) -> StaffResult<Json<StaffResponse>> {
    Ok(Json(service.me(&principal).await?.into()))
}

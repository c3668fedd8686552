use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    AuditEvent, AuditOutcome, Principal, TokenService, UuidPath, ValidatedJson, authenticate,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::StoreResult;
use crate::models::{
    CreateStore, DeleteResponse, Store, StoreList, StoreSettings, StoreSettingsInput, UpdateStore,
};
use crate::repository::StoreRepository;
use crate::service::StoreService;

pub const TAG: &str = "stores";

type SharedService<R> = Arc<StoreService<R>>;

/// OpenAPI documentation for the stores endpoints
#[derive(OpenApi)]
#[openapi(
    paths(create_store, list_stores, get_store, update_store, delete_store),
    components(
        schemas(
            Store,
            StoreSettings,
            StoreSettingsInput,
            CreateStore,
            UpdateStore,
            StoreList,
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
        (name = TAG, description = "Stores of the authenticated owner")
    )
)]
pub struct ApiDoc;

/// Create the stores router. Every route requires an owner access token and
/// only ever sees the caller's own stores.
pub fn router<R: StoreRepository + 'static>(service: StoreService<R>, tokens: TokenService) -> Router {
    Router::new()
        .route("/", get(list_stores).post(create_store))
        .route(
            "/{store_id}",
            get(get_store).put(update_store).delete(delete_store),
        )
        .route_layer(from_fn_with_state(tokens, authenticate))
        .with_state(Arc::new(service))
}

/// Create a store
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateStore,
    responses(
        (status = 201, description = "Store created", body = Store),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_store<R: StoreRepository>(
    State(service): State<SharedService<R>>,
    principal: Principal,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateStore>,
) -> StoreResult<impl IntoResponse> {
    let store = service.create_store(principal.subject_id, input).await?;

    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "store.create",
        Some(format!("store:{}", store.id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok((StatusCode::CREATED, Json(store)))
}

/// List the caller's stores
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    responses(
        (status = 200, description = "Stores owned by the caller", body = StoreList),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn list_stores<R: StoreRepository>(
    State(service): State<SharedService<R>>,
    principal: Principal,
) -> StoreResult<Json<StoreList>> {
    let stores = service.list_stores(principal.subject_id).await?;
    Ok(Json(StoreList { stores }))
}

/// Get one of the caller's stores
#[utoipa::path(
    get,
    path = "/{store_id}",
    tag = TAG,
    params(("store_id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Store found", body = Store),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_store<R: StoreRepository>(
    State(service): State<SharedService<R>>,
    principal: Principal,
    UuidPath(id): UuidPath,
) -> StoreResult<Json<Store>> {
    Ok(Json(service.get_store(principal.subject_id, id).await?))
}

/// Update name and/or settings of one of the caller's stores
#[utoipa::path(
    put,
    path = "/{store_id}",
    tag = TAG,
    params(("store_id" = Uuid, Path, description = "Store ID")),
    request_body = UpdateStore,
    responses(
        (status = 200, description = "Store updated", body = Store),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_store<R: StoreRepository>(
    State(service): State<SharedService<R>>,
    principal: Principal,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateStore>,
) -> StoreResult<Json<Store>> {
    Ok(Json(
        service.update_store(principal.subject_id, id, input).await?,
    ))
}

/// Delete one of the caller's stores together with its staff
#[utoipa::path(
    delete,
    path = "/{store_id}",
    tag = TAG,
    params(("store_id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Store deleted", body = DeleteResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_store<R: StoreRepository>(
    State(service): State<SharedService<R>>,
    principal: Principal,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> StoreResult<Json<DeleteResponse>> {
    service.delete_store(principal.subject_id, id).await?;

    AuditEvent::new(
        Some(principal.subject_id.to_string()),
        "store.delete",
        Some(format!("store:{}", id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok(Json(DeleteResponse { success: true }))
}

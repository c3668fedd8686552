use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse, axum_helpers::ErrorCode)
    ),
    info(
        title = "StoreHub API",
        version = "0.1.0",
        description = "Owner accounts and sessions, stores, and store-scoped staff"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/auth", api = domain_users::auth_handlers::ApiDoc),
        (path = "/users", api = domain_users::handlers::ApiDoc),
        (path = "/stores", api = domain_stores::handlers::ApiDoc),
        (path = "/stores", api = domain_staff::handlers::ManagementApiDoc),
        (path = "/staff", api = domain_staff::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;

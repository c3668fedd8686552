use axum::Router;
use axum_helpers::TokenService;
use domain_staff::{InMemoryStaffRepository, PgStaffRepository, StaffRepository, StaffService};
use domain_stores::{InMemoryStoreRepository, PgStoreRepository, StoreRepository, StoreService};
use domain_users::{
    AuthService, InMemoryRefreshTokenStore, InMemoryUserRepository, PgRefreshTokenStore,
    PgUserRepository, RefreshCookie, RefreshTokenStore, UserRepository, UserService,
    auth_handlers,
};
use sea_orm::DatabaseConnection;

pub mod health;

/// Storage backends the API is composed over.
pub struct Repositories<U, T, S, F> {
    pub users: U,
    pub refresh_tokens: T,
    pub stores: S,
    pub staff: F,
}

impl Repositories<PgUserRepository, PgRefreshTokenStore, PgStoreRepository, PgStaffRepository> {
    pub fn postgres(db: &DatabaseConnection) -> Self {
        Self {
            users: PgUserRepository::new(db.clone()),
            refresh_tokens: PgRefreshTokenStore::new(db.clone()),
            stores: PgStoreRepository::new(db.clone()),
            staff: PgStaffRepository::new(db.clone()),
        }
    }
}

impl
    Repositories<
        InMemoryUserRepository,
        InMemoryRefreshTokenStore,
        InMemoryStoreRepository,
        InMemoryStaffRepository,
    >
{
    pub fn in_memory() -> Self {
        Self {
            users: InMemoryUserRepository::new(),
            refresh_tokens: InMemoryRefreshTokenStore::new(),
            stores: InMemoryStoreRepository::new(),
            staff: InMemoryStaffRepository::new(),
        }
    }
}

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
pub fn routes(state: &crate::state::AppState) -> Router {
    let cookie = RefreshCookie {
        secure: state.config.auth.cookie_secure,
        max_age_secs: state.tokens.refresh_ttl_secs(),
    };
    compose(Repositories::postgres(&state.db), state.tokens.clone(), cookie)
}

/// Wires services over `repositories` and mounts every domain router.
///
/// Returns a stateless Router (all sub-routers have state already applied).
/// Staff management shares the `/stores` prefix with the stores router.
pub fn compose<U, T, S, F>(
    repositories: Repositories<U, T, S, F>,
    tokens: TokenService,
    cookie: RefreshCookie,
) -> Router
where
    U: UserRepository + Clone + 'static,
    T: RefreshTokenStore + Clone + 'static,
    S: StoreRepository + 'static,
    F: StaffRepository + 'static,
{
    let Repositories {
        users,
        refresh_tokens,
        stores,
        staff,
    } = repositories;

    let auth = AuthService::new(users.clone(), refresh_tokens.clone(), tokens.clone());
    let users = UserService::new(users, refresh_tokens);
    let stores = StoreService::new(stores);
    // The store service doubles as the staff domain's StoreLookup
    let staff = StaffService::new(staff, stores.clone(), tokens.clone());

    let store_routes = domain_stores::handlers::router(stores, tokens.clone()).merge(
        domain_staff::handlers::management_router(staff.clone(), tokens.clone()),
    );

    Router::new()
        .nest("/auth", auth_handlers::router(auth, cookie))
        .nest("/users", domain_users::handlers::router(users, tokens.clone()))
        .nest("/stores", store_routes)
        .nest("/staff", domain_staff::handlers::session_router(staff, tokens))
}

/// Creates a router with the /ready endpoint that performs actual health checks.
///
/// This router has state applied and can be merged with the stateless app router
/// from `create_router`.
pub fn ready_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

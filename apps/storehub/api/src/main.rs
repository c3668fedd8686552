use axum_helpers::TokenService;
use axum_helpers::server::{close_postgres, create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_users::{AuthService, PgRefreshTokenStore, PgUserRepository, seed_users};
use std::time::Duration;
use tracing::info;

use storehub_api::config::Config;
use storehub_api::state::AppState;
use storehub_api::{api, openapi};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables; refuses weak JWT secrets in production
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
        .await
        .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;

    let tokens = TokenService::new(&config.auth);

    let users = PgUserRepository::new(db.clone());
    let maintenance = AuthService::new(
        users.clone(),
        PgRefreshTokenStore::new(db.clone()),
        tokens.clone(),
    );
    match maintenance.purge_expired_sessions().await {
        Ok(purged) => info!(purged, "Expired refresh tokens removed"),
        Err(e) => tracing::warn!("Failed to purge expired refresh tokens: {}", e),
    }

    if config.seed_users {
        // A failed seed leaves the API usable, so it does not abort startup
        if let Err(e) = seed_users(&users).await {
            tracing::error!("Seeding users failed: {}", e);
        }
    }

    let state = AppState { config, db, tokens };

    let api_routes = api::routes(&state);

    // create_router adds docs/middleware to our composed routes
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes)?;

    // - /health: liveness check with app name/version
    // - /ready: readiness check against the database
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!("Starting StoreHub API with graceful shutdown (30s timeout)");

    let db = state.db.clone();
    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing database connections");
            close_postgres(db, "main").await;
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("StoreHub API shutdown complete");
    Ok(())
}

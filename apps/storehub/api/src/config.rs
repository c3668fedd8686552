use core_config::{AppInfo, FromEnv, app_info, auth::AuthConfig, env_parse_or_default, server::ServerConfig};

// Import database configs from the database library
use database::postgres::PostgresConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub auth: AuthConfig,
    /// Upsert the development accounts at startup
    pub seed_users: bool,
}

impl Config {
    /// Fails when a required variable is missing or, in production, when
    /// the JWT secrets are weak.
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?; // Required - will fail if not set
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=3001
        let auth = AuthConfig::load(&environment)?;
        let seed_users = env_parse_or_default("SEED_USERS", environment.is_development())?;

        Ok(Self {
            app: app_info!(),
            database,
            server,
            environment,
            auth,
            seed_users,
        })
    }
}

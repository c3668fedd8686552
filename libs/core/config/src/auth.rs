//! Token signing configuration.
//!
//! Loaded once at startup. Development falls back to well-known secrets so the
//! stack runs without setup; production refuses to start on anything that
//! looks like a default.

use crate::{ConfigError, Environment, FromEnv, env_parse_or_default};

pub const DEV_ACCESS_SECRET: &str = "dev-access-secret-not-for-production-use-000";
pub const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-not-for-production-use-000";

/// Secrets shipped in sample env files and old deployments.
const KNOWN_DEFAULT_SECRETS: &[&str] = &[
    "supersecret",
    "refreshsupersecret",
    "superrefreshsecret",
    "secret",
    "changeme",
    DEV_ACCESS_SECRET,
    DEV_REFRESH_SECRET,
];

const MIN_SECRET_LEN: usize = 32;

/// Upper bound for every token lifetime: one year
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Owner access tokens: 15 minutes
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Staff access tokens cover a shift: 12 hours
pub const DEFAULT_STAFF_TOKEN_TTL_SECS: i64 = 12 * 60 * 60;
/// Refresh tokens and their cookie: 7 days
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Signing secrets and lifetimes for access and refresh tokens.
///
/// Environment variables:
/// - `JWT_ACCESS_SECRET` / `JWT_REFRESH_SECRET` (required in production, at least 32 bytes, distinct)
/// - `ACCESS_TOKEN_TTL_SECS` (default 900; every TTL is capped at one year)
/// - `STAFF_TOKEN_TTL_SECS` (default 43200)
/// - `REFRESH_TOKEN_TTL_SECS` (default 604800)
/// - `COOKIE_SECURE` (default: true in production)
#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl_secs: i64,
    pub staff_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub cookie_secure: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("staff_token_ttl_secs", &self.staff_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl AuthConfig {
    /// Config with explicit secrets and default lifetimes. Used by tests and tools.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            staff_token_ttl_secs: DEFAULT_STAFF_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            cookie_secure: false,
        }
    }

    /// Development config using the built-in secrets.
    pub fn development() -> Self {
        Self::new(DEV_ACCESS_SECRET, DEV_REFRESH_SECRET)
    }

    /// Load for the given environment, validating secrets when it is production.
    pub fn load(environment: &Environment) -> Result<Self, ConfigError> {
        let access_secret = read_secret("JWT_ACCESS_SECRET", DEV_ACCESS_SECRET, environment)?;
        let refresh_secret = read_secret("JWT_REFRESH_SECRET", DEV_REFRESH_SECRET, environment)?;

        let config = Self {
            access_secret,
            refresh_secret,
            access_token_ttl_secs: env_parse_or_default(
                "ACCESS_TOKEN_TTL_SECS",
                DEFAULT_ACCESS_TOKEN_TTL_SECS,
            )?,
            staff_token_ttl_secs: env_parse_or_default(
                "STAFF_TOKEN_TTL_SECS",
                DEFAULT_STAFF_TOKEN_TTL_SECS,
            )?,
            refresh_token_ttl_secs: env_parse_or_default(
                "REFRESH_TOKEN_TTL_SECS",
                DEFAULT_REFRESH_TOKEN_TTL_SECS,
            )?,
            cookie_secure: env_parse_or_default("COOKIE_SECURE", environment.use_https())?,
        };

        config.validate(environment)?;
        Ok(config)
    }

    /// Checks the invariants that hold in every environment, plus the
    /// secret-strength rules in production.
    pub fn validate(&self, environment: &Environment) -> Result<(), ConfigError> {
        for (key, ttl) in [
            ("ACCESS_TOKEN_TTL_SECS", self.access_token_ttl_secs),
            ("STAFF_TOKEN_TTL_SECS", self.staff_token_ttl_secs),
            ("REFRESH_TOKEN_TTL_SECS", self.refresh_token_ttl_secs),
        ] {
            if ttl <= 0 {
                return Err(ConfigError::ParseError {
                    key: key.to_string(),
                    details: format!("must be positive (got {})", ttl),
                });
            }
            if ttl > MAX_TOKEN_TTL_SECS {
                return Err(ConfigError::ParseError {
                    key: key.to_string(),
                    details: format!("must be at most {} (got {})", MAX_TOKEN_TTL_SECS, ttl),
                });
            }
        }

        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Insecure {
                key: "JWT_REFRESH_SECRET".to_string(),
                details: "must differ from JWT_ACCESS_SECRET".to_string(),
            });
        }

        if environment.is_production() {
            check_production_secret("JWT_ACCESS_SECRET", &self.access_secret)?;
            check_production_secret("JWT_REFRESH_SECRET", &self.refresh_secret)?;
        }

        Ok(())
    }
}

impl FromEnv for AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::load(&Environment::from_env())
    }
}

fn read_secret(
    key: &str,
    dev_default: &str,
    environment: &Environment,
) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ if environment.is_production() => Err(ConfigError::MissingEnvVar(key.to_string())),
        _ => {
            tracing::warn!("{} not set, using the development secret", key);
            Ok(dev_default.to_string())
        }
    }
}

fn check_production_secret(key: &str, secret: &str) -> Result<(), ConfigError> {
    if KNOWN_DEFAULT_SECRETS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(secret.trim()))
    {
        return Err(ConfigError::Insecure {
            key: key.to_string(),
            details: "a default secret cannot be used in production".to_string(),
        });
    }

    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::Insecure {
            key: key.to_string(),
            details: format!(
                "must be at least {} characters (got {}). Generate one with: openssl rand -base64 48",
                MIN_SECRET_LEN,
                secret.len()
            ),
        });
    }

    Ok(())
}

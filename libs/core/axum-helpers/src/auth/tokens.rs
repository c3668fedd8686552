use super::principal::{Principal, TokenType};
use chrono::{Duration, Utc};
use core_config::auth::AuthConfig;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub role: String,
    #[serde(rename = "storeId", default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Claims carried by a refresh token. Owner-users only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, expired, malformed or wrong kind. Callers never learn which.
    #[error("invalid token")]
    InvalidToken,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

struct Keys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: i64,
    staff_ttl: i64,
    refresh_ttl: i64,
}

/// Signs and verifies access and refresh tokens.
///
/// Access and refresh tokens are signed with different secrets, so a token
/// of one kind never verifies as the other.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let keys = Keys {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_token_ttl_secs,
            staff_ttl: config.staff_token_ttl_secs,
            refresh_ttl: config.refresh_token_ttl_secs,
        };

        tracing::info!(
            access_ttl = keys.access_ttl,
            staff_ttl = keys.staff_ttl,
            refresh_ttl = keys.refresh_ttl,
            "Token service initialized"
        );
        Self {
            keys: Arc::new(keys),
        }
    }

    /// Refresh token lifetime in seconds; also the refresh cookie's Max-Age.
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.keys.refresh_ttl
    }

    /// Access token for an owner-user (short TTL) or a staff member (shift TTL).
    pub fn issue_access_token(&self, principal: &Principal) -> Result<String, TokenError> {
        let ttl = match principal.token_type {
            TokenType::Owner => self.keys.access_ttl,
            TokenType::Staff => self.keys.staff_ttl,
        };
        let (iat, exp) = window(ttl);

        let claims = AccessClaims {
            sub: principal.subject_id.to_string(),
            role: principal.role.clone(),
            store_id: principal.store_id.map(|id| id.to_string()),
            token_type: principal.token_type,
            exp,
            iat,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.access_encoding,
        )?)
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        let (iat, exp) = window(self.keys.refresh_ttl);
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            exp,
            iat,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.refresh_encoding,
        )?)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify(token, &self.keys.access_decoding)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.keys.refresh_decoding)
    }
}

fn window(ttl_secs: i64) -> (i64, i64) {
    let now = Utc::now();
    (now.timestamp(), (now + Duration::seconds(ttl_secs)).timestamp())
}

fn verify<C: DeserializeOwned>(token: &str, key: &DecodingKey) -> Result<C, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<C>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            TokenError::InvalidToken
        })
}

//! Identity Resolver for owner-users: registration, login, refresh rotation
//! and logout.

use axum_helpers::{Principal, TokenService, hash_password, verify_password_or_dummy};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult, UserError};
use crate::models::{LoginRequest, RegisterRequest, Role, User, UserResponse, normalize_email};
use crate::refresh_token::RefreshTokenStore;
use crate::repository::UserRepository;

/// Tokens handed out by login and refresh
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Clone)]
pub struct AuthService<R: UserRepository, S: RefreshTokenStore> {
    users: Arc<R>,
    refresh_tokens: Arc<S>,
    tokens: TokenService,
}

impl<R: UserRepository, S: RefreshTokenStore> AuthService<R, S> {
    pub fn new(users: R, refresh_tokens: S, tokens: TokenService) -> Self {
        Self {
            users: Arc::new(users),
            refresh_tokens: Arc::new(refresh_tokens),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// `DuplicateIdentity` if the email is already registered
    pub async fn register(&self, input: RegisterRequest) -> AuthResult<UserResponse> {
        let email = normalize_email(&input.email);

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity(email));
        }

        let password_hash = hash_password(&input.password).map_err(UserError::from)?;
        let user = User::new(email, input.name, password_hash, Role::User);

        // The unique index still decides when two registrations race
        let created = self.users.create(user).await.map_err(|e| match e {
            UserError::DuplicateEmail(email) => AuthError::DuplicateIdentity(email),
            other => AuthError::User(other),
        })?;

        tracing::info!(user_id = %created.id, "Registered user");
        Ok(created.into())
    }

    /// Unknown email and wrong password both fail with `InvalidCredentials`
    /// after one Argon2 verification each
    pub async fn login(
        &self,
        input: LoginRequest,
        ip_address: Option<String>,
    ) -> AuthResult<AuthSession> {
        let email = normalize_email(&input.email);

        let user = self.users.get_by_email(&email).await?;
        let password_ok = verify_password_or_dummy(
            user.as_ref().map(|u| u.password_hash.as_str()),
            &input.password,
        );
        let Some(user) = user.filter(|_| password_ok) else {
            return Err(AuthError::InvalidCredentials);
        };

        let refresh_token = self.tokens.issue_refresh_token(user.id)?;
        self.refresh_tokens
            .issue(
                user.id,
                &refresh_token,
                self.tokens.refresh_ttl_secs(),
                ip_address,
            )
            .await?;

        let access_token = self.issue_access(&user)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(AuthSession {
            access_token,
            refresh_token,
            user: user.into(),
        })
    }

    /// Exchanges a refresh token for a new pair. The presented token is
    /// consumed first; a replay of it afterwards fails the same way as a
    /// forged or expired one.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        ip_address: Option<String>,
    ) -> AuthResult<AuthSession> {
        let claims = self
            .tokens
            .verify_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidRefreshToken)?;

        let record = self
            .refresh_tokens
            .consume(user_id, refresh_token)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user_id, "Refresh token not found or already used");
                AuthError::InvalidRefreshToken
            })?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let new_refresh_token = self.tokens.issue_refresh_token(user.id)?;
        self.refresh_tokens
            .rotate(
                record.id,
                user.id,
                &new_refresh_token,
                self.tokens.refresh_ttl_secs(),
                ip_address,
            )
            .await?;

        let access_token = self.issue_access(&user)?;

        tracing::debug!(user_id = %user.id, "Refresh token rotated");
        Ok(AuthSession {
            access_token,
            refresh_token: new_refresh_token,
            user: user.into(),
        })
    }

    /// Idempotent: an unknown token is not an error
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<()> {
        let removed = self.refresh_tokens.revoke_one(refresh_token).await?;
        tracing::debug!(removed, "Logout");
        Ok(())
    }

    /// Ends every session of the user
    pub async fn logout_all(&self, user_id: Uuid) -> AuthResult<u64> {
        let removed = self.refresh_tokens.revoke_all(user_id).await?;
        tracing::info!(user_id = %user_id, removed, "Revoked all refresh tokens");
        Ok(removed)
    }

    pub async fn me(&self, user_id: Uuid) -> AuthResult<UserResponse> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;
        Ok(user.into())
    }

    /// Sweep expired refresh records
    pub async fn purge_expired_sessions(&self) -> AuthResult<u64> {
        Ok(self.refresh_tokens.revoke_expired().await?)
    }

    fn issue_access(&self, user: &User) -> AuthResult<String> {
        let principal = Principal::owner(user.id, user.role.to_string());
        Ok(self.tokens.issue_access_token(&principal)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh_token::InMemoryRefreshTokenStore;
    use crate::repository::InMemoryUserRepository;
    use axum_helpers::TokenType;
    use core_config::auth::AuthConfig;

    type Service = AuthService<InMemoryUserRepository, InMemoryRefreshTokenStore>;

    fn setup() -> (Service, InMemoryRefreshTokenStore) {
        let store = InMemoryRefreshTokenStore::new();
        let service = AuthService::new(
            InMemoryUserRepository::new(),
            store.clone(),
            TokenService::new(&AuthConfig::development()),
        );
        (service, store)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "pw123456".to_string(),
            name: "A".to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, store) = setup();
        let user = service.register(register_request("a@x.com")).await.unwrap();
        assert_eq!(user.role, Role::User);

        let session = service
            .login(login_request("a@x.com", "pw123456"), None)
            .await
            .unwrap();
        let claims = service
            .tokens()
            .verify_access_token(&session.access_token)
            .unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.token_type, TokenType::Owner);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (service, _) = setup();
        service.register(register_request("a@x.com")).await.unwrap();

        let again = service.register(register_request("A@x.com")).await;
        assert!(matches!(again, Err(AuthError::DuplicateIdentity(_))));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = setup();
        service.register(register_request("a@x.com")).await.unwrap();

        let unknown = service
            .login(login_request("nobody@x.com", "pw123456"), None)
            .await;
        let wrong = service
            .login(login_request("a@x.com", "wrong-password"), None)
            .await;

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_email_login_takes_as_long_as_wrong_password() {
        let (service, _) = setup();
        service.register(register_request("a@x.com")).await.unwrap();
        let _ = service
            .login(login_request("nobody@x.com", "wrong-pw"), None)
            .await;

        let start = std::time::Instant::now();
        let _ = service
            .login(login_request("a@x.com", "wrong-pw"), None)
            .await;
        let known = start.elapsed();

        let start = std::time::Instant::now();
        let _ = service
            .login(login_request("nobody@x.com", "wrong-pw"), None)
            .await;
        let unknown = start.elapsed();

        assert!(unknown * 4 >= known, "unknown {unknown:?} vs known {known:?}");
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_rejects_replay() {
        let (service, store) = setup();
        service.register(register_request("a@x.com")).await.unwrap();
        let session = service
            .login(login_request("a@x.com", "pw123456"), None)
            .await
            .unwrap();

        let rotated = service.refresh(&session.refresh_token, None).await.unwrap();
        assert_ne!(rotated.refresh_token, session.refresh_token);
        assert_eq!(store.len().await, 1);

        let replay = service.refresh(&session.refresh_token, None).await;
        assert!(matches!(replay, Err(AuthError::InvalidRefreshToken)));

        service.refresh(&rotated.refresh_token, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token_and_garbage() {
        let (service, _) = setup();
        service.register(register_request("a@x.com")).await.unwrap();
        let session = service
            .login(login_request("a@x.com", "pw123456"), None)
            .await
            .unwrap();

        assert!(matches!(
            service.refresh(&session.access_token, None).await,
            Err(AuthError::InvalidRefreshToken)
        ));
        assert!(matches!(
            service.refresh("garbage", None).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_has_one_winner() {
        let (service, _) = setup();
        service.register(register_request("a@x.com")).await.unwrap();
        let session = service
            .login(login_request("a@x.com", "pw123456"), None)
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            service.refresh(&session.refresh_token, None),
            service.refresh(&session.refresh_token, None),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (service, store) = setup();
        service.register(register_request("a@x.com")).await.unwrap();
        let session = service
            .login(login_request("a@x.com", "pw123456"), None)
            .await
            .unwrap();

        service.logout(&session.refresh_token).await.unwrap();
        service.logout(&session.refresh_token).await.unwrap();
        assert!(store.is_empty().await);

        assert!(matches!(
            service.refresh(&session.refresh_token, None).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_logout_all_ends_every_session() {
        let (service, store) = setup();
        let user = service.register(register_request("a@x.com")).await.unwrap();
        for _ in 0..3 {
            service
                .login(login_request("a@x.com", "pw123456"), None)
                .await
                .unwrap();
        }

        assert_eq!(service.logout_all(user.id).await.unwrap(), 3);
        assert!(store.is_empty().await);
    }
}

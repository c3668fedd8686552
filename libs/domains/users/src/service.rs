use axum_helpers::{hash_password, verify_password};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{UpdateProfile, User, UserResponse, normalize_email};
use crate::refresh_token::RefreshTokenStore;
use crate::repository::UserRepository;

/// Profile and administration of owner-user accounts
#[derive(Clone)]
pub struct UserService<R: UserRepository, S: RefreshTokenStore> {
    repository: Arc<R>,
    refresh_tokens: Arc<S>,
}

impl<R: UserRepository, S: RefreshTokenStore> UserService<R, S> {
    pub fn new(repository: R, refresh_tokens: S) -> Self {
        Self {
            repository: Arc::new(repository),
            refresh_tokens: Arc::new(refresh_tokens),
        }
    }

    async fn load(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        Ok(self.load(id).await?.into())
    }

    pub async fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.list().await?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    /// Change name and/or email of the caller
    pub async fn update_profile(&self, id: Uuid, input: UpdateProfile) -> UserResult<UserResponse> {
        let mut user = self.load(id).await?;

        if let Some(email) = input.email {
            let email = normalize_email(&email);
            if email != user.email {
                if self.repository.get_by_email(&email).await?.is_some() {
                    return Err(UserError::DuplicateEmail(email));
                }
                user.email = email;
            }
        }
        if let Some(name) = input.name {
            user.name = name;
        }
        user.updated_at = Utc::now();

        Ok(self.repository.update(user).await?.into())
    }

    /// Self-service password change; the current password must match
    pub async fn change_password(
        &self,
        id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> UserResult<()> {
        let mut user = self.load(id).await?;

        if !verify_password(&user.password_hash, old_password) {
            return Err(UserError::InvalidOldPassword);
        }

        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();
        self.repository.update(user).await?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }

    pub async fn set_avatar(&self, id: Uuid, avatar_url: String) -> UserResult<UserResponse> {
        let mut user = self.load(id).await?;
        user.avatar_url = Some(avatar_url);
        user.updated_at = Utc::now();
        Ok(self.repository.update(user).await?.into())
    }

    pub async fn clear_avatar(&self, id: Uuid) -> UserResult<UserResponse> {
        let mut user = self.load(id).await?;
        user.avatar_url = None;
        user.updated_at = Utc::now();
        Ok(self.repository.update(user).await?.into())
    }

    /// The caller deletes their own account. Sessions go with it.
    pub async fn delete_self(&self, id: Uuid) -> UserResult<()> {
        self.refresh_tokens.revoke_all(id).await?;

        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    pub async fn update_role(&self, id: Uuid, role: crate::models::Role) -> UserResult<UserResponse> {
        let mut user = self.load(id).await?;
        user.role = role;
        user.updated_at = Utc::now();

        let updated = self.repository.update(user).await?;
        tracing::info!(user_id = %id, role = %updated.role, "Role changed");
        Ok(updated.into())
    }

    /// Admin password reset; no knowledge of the old password required
    pub async fn reset_password(&self, id: Uuid, new_password: &str) -> UserResult<()> {
        let mut user = self.load(id).await?;
        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();
        self.repository.update(user).await?;
        Ok(())
    }

    /// Admin deletion of another account. Admin accounts are never deleted
    /// here; the role is checked by the delete itself, not by an earlier read.
    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        if !self.repository.delete_non_admin(id).await? {
            return match self.repository.get_by_id(id).await? {
                Some(_) => Err(UserError::AdminProtected),
                None => Err(UserError::NotFound(id)),
            };
        }

        self.refresh_tokens.revoke_all(id).await?;
        Ok(())
    }
}

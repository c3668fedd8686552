use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Repository trait for owner-user persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; `DuplicateEmail` if the email is taken
    async fn create(&self, user: User) -> UserResult<User>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Lookup by (already normalized) email
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// All users, newest first
    async fn list(&self) -> UserResult<Vec<User>>;

    /// Persist changes to an existing user; `NotFound` if it is gone
    async fn update(&self, user: User) -> UserResult<User>;

    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    /// Delete unless the stored role is admin, checked in the same step.
    /// `false` when nothing was removed.
    async fn delete_non_admin(&self, id: Uuid) -> UserResult<bool>;

    /// Insert, or overwrite name/password/role of the user holding `user.email`
    async fn upsert_by_email(&self, user: User) -> UserResult<User>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut result: Vec<User> = users.values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }

        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut users = self.users.write().await;

        if users.remove(&id).is_some() {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_non_admin(&self, id: Uuid) -> UserResult<bool> {
        let mut users = self.users.write().await;

        match users.get(&id) {
            Some(user) if !user.is_admin() => {
                users.remove(&id);
                tracing::info!(user_id = %id, "Deleted user");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn upsert_by_email(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        let existing_id = users
            .values()
            .find(|u| u.email == user.email)
            .map(|u| u.id);

        let stored = match existing_id.and_then(|id| users.get_mut(&id)) {
            Some(current) => {
                current.name = user.name;
                current.password_hash = user.password_hash;
                current.role = user.role;
                current.updated_at = chrono::Utc::now();
                current.clone()
            }
            None => {
                users.insert(user.id, user.clone());
                user
            }
        };

        Ok(stored)
    }
}

//! Development accounts synced at startup.

use axum_helpers::hash_password;

use crate::error::UserResult;
use crate::models::{Role, User};
use crate::repository::UserRepository;

/// `(email, password, name, role)` of every seeded account
pub const SEED_USERS: [(&str, &str, &str, Role); 2] = [
    ("admin@gmail.com", "admin123", "Admin User", Role::Admin),
    ("test@gmail.com", "test123", "Test User", Role::User),
];

/// Upsert the seed accounts, resetting their password, name and role.
pub async fn seed_users<R: UserRepository + ?Sized>(repository: &R) -> UserResult<()> {
    for (email, password, name, role) in SEED_USERS {
        let user = User::new(
            email.to_string(),
            name.to_string(),
            hash_password(password)?,
            role,
        );
        let synced = repository.upsert_by_email(user).await?;
        tracing::info!(user_id = %synced.id, email, role = %role, "Seed user synced");
    }

    Ok(())
}

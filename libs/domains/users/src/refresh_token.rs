//! Refresh Token Store.
//!
//! Persisted record of every refresh token handed to an owner-user. A token
//! is usable only while its record exists and has not expired; refresh
//! rotation removes the old record before the new one is written, so an
//! interrupted rotation leaves the user logged out rather than holding two
//! valid tokens.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::UserResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn new(user_id: Uuid, token: &str, ttl_secs: i64, ip_address: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            token_hash: hash_token(token),
            expires_at: now + Duration::seconds(ttl_secs),
            ip_address,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// SHA-256 hex digest under which a refresh token is stored and looked up.
pub fn hash_token(token: &str) -> String {
    const_hex::encode(Sha256::digest(token.as_bytes()))
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a newly issued refresh token.
    async fn issue(
        &self,
        user_id: Uuid,
        token: &str,
        ttl_secs: i64,
        ip_address: Option<String>,
    ) -> UserResult<RefreshTokenRecord>;

    /// Atomically find and remove the record for the exact `(user_id, token)`
    /// pair. `None` when the token is unknown, already consumed or expired.
    async fn consume(&self, user_id: Uuid, token: &str) -> UserResult<Option<RefreshTokenRecord>>;

    /// Delete `old_id` and then persist `new_token` for the same user.
    async fn rotate(
        &self,
        old_id: Uuid,
        user_id: Uuid,
        new_token: &str,
        ttl_secs: i64,
        ip_address: Option<String>,
    ) -> UserResult<RefreshTokenRecord>;

    /// Remove every refresh token of `user_id`. Returns how many were removed.
    async fn revoke_all(&self, user_id: Uuid) -> UserResult<u64>;

    /// Remove a single token. `false` if it was not stored.
    async fn revoke_one(&self, token: &str) -> UserResult<bool>;

    /// Sweep records past their expiry.
    async fn revoke_expired(&self) -> UserResult<u64>;
}

/// In-memory implementation of RefreshTokenStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryRefreshTokenStore {
    records: Arc<RwLock<HashMap<Uuid, RefreshTokenRecord>>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn issue(
        &self,
        user_id: Uuid,
        token: &str,
        ttl_secs: i64,
        ip_address: Option<String>,
    ) -> UserResult<RefreshTokenRecord> {
        let record = RefreshTokenRecord::new(user_id, token, ttl_secs, ip_address);
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn consume(&self, user_id: Uuid, token: &str) -> UserResult<Option<RefreshTokenRecord>> {
        let token_hash = hash_token(token);
        let mut records = self.records.write().await;

        let found = records
            .values()
            .find(|r| r.user_id == user_id && r.token_hash == token_hash)
            .map(|r| r.id);

        Ok(found
            .and_then(|id| records.remove(&id))
            .filter(|record| !record.is_expired()))
    }

    async fn rotate(
        &self,
        old_id: Uuid,
        user_id: Uuid,
        new_token: &str,
        ttl_secs: i64,
        ip_address: Option<String>,
    ) -> UserResult<RefreshTokenRecord> {
        let record = RefreshTokenRecord::new(user_id, new_token, ttl_secs, ip_address);

        let mut records = self.records.write().await;
        records.remove(&old_id);
        records.insert(record.id, record.clone());

        Ok(record)
    }

    async fn revoke_all(&self, user_id: Uuid) -> UserResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.user_id != user_id);
        Ok((before - records.len()) as u64)
    }

    async fn revoke_one(&self, token: &str) -> UserResult<bool> {
        let token_hash = hash_token(token);
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.token_hash != token_hash);
        Ok(records.len() < before)
    }

    async fn revoke_expired(&self) -> UserResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !r.is_expired());
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: i64 = 7 * 24 * 60 * 60;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("abc"));
        assert_ne!(hash, hash_token("abd"));
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let store = InMemoryRefreshTokenStore::new();
        let user_id = Uuid::now_v7();
        store.issue(user_id, "token-1", WEEK, None).await.unwrap();

        assert!(store.consume(user_id, "token-1").await.unwrap().is_some());
        assert!(store.consume(user_id, "token-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_consume_requires_matching_user() {
        let store = InMemoryRefreshTokenStore::new();
        store.issue(Uuid::now_v7(), "token-1", WEEK, None).await.unwrap();

        assert!(
            store
                .consume(Uuid::now_v7(), "token-1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_expired_record_is_not_consumable() {
        let store = InMemoryRefreshTokenStore::new();
        let user_id = Uuid::now_v7();
        store.issue(user_id, "old", -1, None).await.unwrap();

        assert!(store.consume(user_id, "old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rotate_replaces_record() {
        let store = InMemoryRefreshTokenStore::new();
        let user_id = Uuid::now_v7();
        let old = store.issue(user_id, "first", WEEK, None).await.unwrap();

        let new = store
            .rotate(old.id, user_id, "second", WEEK, Some("10.0.0.1".into()))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(new.ip_address.as_deref(), Some("10.0.0.1"));
        assert!(store.consume(user_id, "first").await.unwrap().is_none());
        assert!(store.consume(user_id, "second").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_consume_has_one_winner() {
        let store = InMemoryRefreshTokenStore::new();
        let user_id = Uuid::now_v7();
        store.issue(user_id, "shared", WEEK, None).await.unwrap();

        let a = store.clone();
        let b = store.clone();
        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.consume(user_id, "shared").await.unwrap() }),
            tokio::spawn(async move { b.consume(user_id, "shared").await.unwrap() }),
        );

        let winners = [first.unwrap(), second.unwrap()]
            .into_iter()
            .filter(Option::is_some)
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_revocation() {
        let store = InMemoryRefreshTokenStore::new();
        let user_id = Uuid::now_v7();
        let other = Uuid::now_v7();
        store.issue(user_id, "a", WEEK, None).await.unwrap();
        store.issue(user_id, "b", WEEK, None).await.unwrap();
        store.issue(other, "c", WEEK, None).await.unwrap();
        store.issue(other, "stale", -1, None).await.unwrap();

        assert!(store.revoke_one("a").await.unwrap());
        assert!(!store.revoke_one("a").await.unwrap());
        assert_eq!(store.revoke_all(user_id).await.unwrap(), 1);
        assert_eq!(store.revoke_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }
}

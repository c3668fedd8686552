use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::Store;

/// Repository trait for Store persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Insert a store; `SlugTaken` if the slug is already used
    async fn create(&self, store: Store) -> StoreResult<Store>;

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Store>>;

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Store>>;

    /// The store only if it exists AND belongs to `owner_id`, in one lookup
    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Store>>;

    /// Stores of one owner, newest first
    async fn list_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Store>>;

    /// Persist name and settings of an existing store
    async fn update(&self, store: Store) -> StoreResult<Store>;

    /// Delete only when owned by `owner_id`. `false` when nothing matched.
    async fn delete_owned(&self, id: Uuid, owner_id: Uuid) -> StoreResult<bool>;
}

/// In-memory implementation of StoreRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryStoreRepository {
    stores: Arc<RwLock<HashMap<Uuid, Store>>>,
}

impl InMemoryStoreRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreRepository for InMemoryStoreRepository {
    async fn create(&self, store: Store) -> StoreResult<Store> {
        let mut stores = self.stores.write().await;

        if stores.values().any(|s| s.slug == store.slug) {
            return Err(StoreError::SlugTaken(store.slug));
        }

        stores.insert(store.id, store.clone());
        Ok(store)
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Store>> {
        let stores = self.stores.read().await;
        Ok(stores.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Store>> {
        let stores = self.stores.read().await;
        Ok(stores.values().find(|s| s.slug == slug).cloned())
    }

    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Store>> {
        let stores = self.stores.read().await;
        Ok(stores
            .get(&id)
            .filter(|s| s.owner_id == owner_id)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Store>> {
        let stores = self.stores.read().await;
        let mut owned: Vec<Store> = stores
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update(&self, store: Store) -> StoreResult<Store> {
        let mut stores = self.stores.write().await;

        let existing = stores
            .get_mut(&store.id)
            .ok_or(StoreError::NotFound(store.id))?;
        existing.name = store.name;
        existing.settings = store.settings;
        existing.updated_at = store.updated_at;

        Ok(existing.clone())
    }

    async fn delete_owned(&self, id: Uuid, owner_id: Uuid) -> StoreResult<bool> {
        let mut stores = self.stores.write().await;

        if stores.get(&id).is_some_and(|s| s.owner_id == owner_id) {
            stores.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreSettings;

    fn store(owner_id: Uuid, slug: &str) -> Store {
        Store::new(
            owner_id,
            "Shop".to_string(),
            slug.to_string(),
            StoreSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_slug_is_globally_unique() {
        let repo = InMemoryStoreRepository::new();
        repo.create(store(Uuid::now_v7(), "abc123")).await.unwrap();

        let result = repo.create(store(Uuid::now_v7(), "abc123")).await;
        assert!(matches!(result, Err(StoreError::SlugTaken(_))));
    }

    #[tokio::test]
    async fn test_find_owned_hides_foreign_stores() {
        let repo = InMemoryStoreRepository::new();
        let owner = Uuid::now_v7();
        let created = repo.create(store(owner, "abc123")).await.unwrap();

        assert!(repo.find_owned(created.id, owner).await.unwrap().is_some());
        assert!(repo.find_owned(created.id, Uuid::now_v7()).await.unwrap().is_none());
        assert!(repo.find_owned(Uuid::now_v7(), owner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_owned() {
        let repo = InMemoryStoreRepository::new();
        let owner = Uuid::now_v7();
        let created = repo.create(store(owner, "abc123")).await.unwrap();

        assert!(!repo.delete_owned(created.id, Uuid::now_v7()).await.unwrap());
        assert!(repo.delete_owned(created.id, owner).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let repo = InMemoryStoreRepository::new();
        let owner = Uuid::now_v7();
        repo.create(store(owner, "aaa111")).await.unwrap();
        repo.create(store(owner, "bbb222")).await.unwrap();
        repo.create(store(Uuid::now_v7(), "ccc333")).await.unwrap();

        assert_eq!(repo.list_by_owner(owner).await.unwrap().len(), 2);
    }
}

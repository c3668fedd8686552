use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::lookup::StoreLookup;
use crate::models::{CreateStore, Store, StoreSettings, UpdateStore};
use crate::repository::StoreRepository;
use crate::slug::generate_slug;

/// How many generated slugs are tried before giving up
pub const SLUG_ATTEMPTS: usize = 5;

/// Store management for owner-users
pub struct StoreService<R: StoreRepository> {
    repository: Arc<R>,
}

impl<R: StoreRepository> Clone for StoreService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<R: StoreRepository> StoreService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a store owned by `owner_id`.
    ///
    /// A client-chosen slug gets one attempt. A generated slug is retried on
    /// collision; the unique index is the only authority on availability.
    pub async fn create_store(&self, owner_id: Uuid, input: CreateStore) -> StoreResult<Store> {
        let mut settings = StoreSettings::default();
        if let Some(overrides) = input.settings {
            settings.apply(overrides);
        }

        if let Some(slug) = input.slug {
            let created = self
                .repository
                .create(Store::new(owner_id, input.name, slug, settings))
                .await?;
            tracing::info!(store_id = %created.id, owner_id = %owner_id, "Created store");
            return Ok(created);
        }

        for attempt in 1..=SLUG_ATTEMPTS {
            let store = Store::new(owner_id, input.name.clone(), generate_slug(), settings.clone());

            match self.repository.create(store).await {
                Ok(created) => {
                    tracing::info!(store_id = %created.id, owner_id = %owner_id, slug = %created.slug, "Created store");
                    return Ok(created);
                }
                Err(StoreError::SlugTaken(slug)) => {
                    tracing::debug!(attempt, slug = %slug, "Generated slug collided, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::error!(owner_id = %owner_id, "Slug generation exhausted");
        Err(StoreError::SlugExhausted(SLUG_ATTEMPTS))
    }

    pub async fn list_stores(&self, owner_id: Uuid) -> StoreResult<Vec<Store>> {
        self.repository.list_by_owner(owner_id).await
    }

    pub async fn get_store(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Store> {
        self.owned(id, owner_id).await
    }

    pub async fn update_store(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: UpdateStore,
    ) -> StoreResult<Store> {
        let mut store = self.owned(id, owner_id).await?;

        if let Some(name) = input.name {
            store.name = name;
        }
        if let Some(settings) = input.settings {
            store.settings.apply(settings);
        }
        store.updated_at = Utc::now();

        self.repository.update(store).await
    }

    /// Staff of the store go with it (cascade)
    pub async fn delete_store(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()> {
        if !self.repository.delete_owned(id, owner_id).await? {
            return Err(StoreError::NotFound(id));
        }
        tracing::info!(store_id = %id, owner_id = %owner_id, "Deleted store");
        Ok(())
    }

    async fn owned(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Store> {
        self.repository
            .find_owned(id, owner_id)
            .await?
            .ok_or(StoreError::NotFound(id))
    }
}

#[async_trait]
impl<R: StoreRepository> StoreLookup for StoreService<R> {
    async fn find_store(&self, reference: &str) -> StoreResult<Option<Store>> {
        let reference = reference.trim();
        match Uuid::parse_str(reference) {
            Ok(id) => self.repository.get_by_id(id).await,
            Err(_) => {
                self.repository
                    .get_by_slug(&reference.to_lowercase())
                    .await
            }
        }
    }

    async fn require_store_ownership(&self, store_id: Uuid, owner_id: Uuid) -> StoreResult<Store> {
        self.owned(store_id, owner_id).await
    }
}

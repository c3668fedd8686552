use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    SqlErr,
};
use uuid::Uuid;

use crate::entity;
use crate::error::{StoreError, StoreResult};
use crate::models::Store;
use crate::repository::StoreRepository;

/// PostgreSQL implementation of StoreRepository using SeaORM
#[derive(Clone)]
pub struct PgStoreRepository {
    db: DatabaseConnection,
}

impl PgStoreRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StoreRepository for PgStoreRepository {
    async fn create(&self, store: Store) -> StoreResult<Store> {
        let slug = store.slug.clone();
        let active_model: entity::ActiveModel = store.into();

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                StoreError::SlugTaken(slug)
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Store>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Store>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Store>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Id.eq(id))
            .filter(entity::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Store>> {
        let models = entity::Entity::find()
            .filter(entity::Column::OwnerId.eq(owner_id))
            .order_by_desc(entity::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, store: Store) -> StoreResult<Store> {
        let id = store.id;
        let active_model = entity::ActiveModel {
            id: Set(store.id),
            owner_id: NotSet,
            name: Set(store.name),
            slug: NotSet,
            currency: Set(store.settings.currency),
            timezone: Set(store.settings.timezone),
            created_at: NotSet,
            updated_at: Set(Utc::now().into()),
        };

        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => StoreError::NotFound(id),
            e => StoreError::Database(e),
        })?;

        Ok(model.into())
    }

    async fn delete_owned(&self, id: Uuid, owner_id: Uuid) -> StoreResult<bool> {
        let result = entity::Entity::delete_many()
            .filter(entity::Column::Id.eq(id))
            .filter(entity::Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

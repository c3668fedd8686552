use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    SqlErr,
};
use uuid::Uuid;

use crate::entity;
use crate::error::{StaffError, StaffResult};
use crate::models::Staff;
use crate::repository::StaffRepository;

/// PostgreSQL implementation of StaffRepository using SeaORM
#[derive(Clone)]
pub struct PgStaffRepository {
    db: DatabaseConnection,
}

impl PgStaffRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StaffRepository for PgStaffRepository {
    async fn create(&self, staff: Staff) -> StaffResult<Staff> {
        let staff_id = staff.staff_id.clone();
        let active_model: entity::ActiveModel = staff.into();

        // The (store_id, staff_id) unique index is the authority
        let model = active_model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                StaffError::DuplicateStaffId(staff_id)
            } else {
                StaffError::Database(e)
            }
        })?;

        Ok(model.into())
    }

    async fn list_by_store(&self, store_id: Uuid) -> StaffResult<Vec<Staff>> {
        let models = entity::Entity::find()
            .filter(entity::Column::StoreId.eq(store_id))
            .order_by_asc(entity::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_in_store(&self, store_id: Uuid, id: Uuid) -> StaffResult<Option<Staff>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Id.eq(id))
            .filter(entity::Column::StoreId.eq(store_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_staff_id(
        &self,
        store_id: Uuid,
        staff_id: &str,
    ) -> StaffResult<Option<Staff>> {
        let model = entity::Entity::find()
            .filter(entity::Column::StoreId.eq(store_id))
            .filter(entity::Column::StaffId.eq(staff_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn update(&self, staff: Staff) -> StaffResult<Staff> {
        let id = staff.id;
        let active_model = entity::ActiveModel {
            id: Set(staff.id),
            store_id: NotSet,
            name: Set(staff.name),
            staff_id: NotSet,
            password_hash: Set(staff.password_hash),
            role: Set(staff.role),
            is_active: Set(staff.is_active),
            created_at: NotSet,
            updated_at: Set(Utc::now().into()),
        };

        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => StaffError::NotFound(id),
            e => StaffError::Database(e),
        })?;

        Ok(model.into())
    }

    async fn delete_in_store(&self, store_id: Uuid, id: Uuid) -> StaffResult<bool> {
        let result = entity::Entity::delete_many()
            .filter(entity::Column::Id.eq(id))
            .filter(entity::Column::StoreId.eq(store_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

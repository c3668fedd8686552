//! Sea-ORM entity for the `staff` table.

use crate::models::{Staff, StaffRole};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "staff")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub staff_id: String,
    pub password_hash: String,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Staff {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            store_id: model.store_id,
            name: model.name,
            staff_id: model.staff_id,
            password_hash: model.password_hash,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Staff> for ActiveModel {
    fn from(staff: Staff) -> Self {
        ActiveModel {
            id: Set(staff.id),
            store_id: Set(staff.store_id),
            name: Set(staff.name),
            staff_id: Set(staff.staff_id),
            password_hash: Set(staff.password_hash),
            role: Set(staff.role),
            is_active: Set(staff.is_active),
            created_at: Set(staff.created_at.into()),
            updated_at: Set(staff.updated_at.into()),
        }
    }
}

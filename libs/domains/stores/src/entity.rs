//! Sea-ORM entity for the `stores` table.

use crate::models::{Store, StoreSettings};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub currency: String,
    pub timezone: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Store {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            slug: model.slug,
            settings: StoreSettings {
                currency: model.currency,
                timezone: model.timezone,
            },
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Store> for ActiveModel {
    fn from(store: Store) -> Self {
        ActiveModel {
            id: Set(store.id),
            owner_id: Set(store.owner_id),
            name: Set(store.name),
            slug: Set(store.slug),
            currency: Set(store.settings.currency),
            timezone: Set(store.settings.timezone),
            created_at: Set(store.created_at.into()),
            updated_at: Set(store.updated_at.into()),
        }
    }
}

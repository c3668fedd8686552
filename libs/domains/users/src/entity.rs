//! Sea-ORM entities for the `users` and `refresh_tokens` tables.

pub mod user {
    use crate::models::Role;
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub email: String,
        pub password_hash: String,
        pub name: String,
        pub role: Role,
        pub avatar_url: Option<String>,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::refresh_token::Entity")]
        RefreshTokens,
    }

    impl Related<super::refresh_token::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::RefreshTokens.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::User {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                email: model.email,
                name: model.name,
                password_hash: model.password_hash,
                role: model.role,
                avatar_url: model.avatar_url,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<crate::models::User> for ActiveModel {
        fn from(user: crate::models::User) -> Self {
            ActiveModel {
                id: Set(user.id),
                email: Set(user.email),
                password_hash: Set(user.password_hash),
                name: Set(user.name),
                role: Set(user.role),
                avatar_url: Set(user.avatar_url),
                created_at: Set(user.created_at.into()),
                updated_at: Set(user.updated_at.into()),
            }
        }
    }
}

pub mod refresh_token {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "refresh_tokens")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub user_id: Uuid,
        /// SHA-256 hex digest of the token; the raw token is never stored
        #[sea_orm(unique)]
        pub token_hash: String,
        pub expires_at: DateTimeWithTimeZone,
        pub ip_address: Option<String>,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::user::Entity",
            from = "Column::UserId",
            to = "super::user::Column::Id",
            on_delete = "Cascade"
        )]
        User,
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::refresh_token::RefreshTokenRecord {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                user_id: model.user_id,
                token_hash: model.token_hash,
                expires_at: model.expires_at.into(),
                ip_address: model.ip_address,
                created_at: model.created_at.into(),
            }
        }
    }
}

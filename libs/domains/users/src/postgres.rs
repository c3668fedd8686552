use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, SqlErr, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{refresh_token, user};
use crate::error::{UserError, UserResult};
use crate::models::{Role, User};
use crate::refresh_token::{RefreshTokenRecord, RefreshTokenStore, hash_token};
use crate::repository::UserRepository;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, input: User) -> UserResult<User> {
        let email = input.email.clone();
        let active_model: user::ActiveModel = input.into();

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserError::DuplicateEmail(email)
            } else {
                UserError::Database(e)
            }
        })?;

        tracing::info!(user_id = %model.id, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let models = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, input: User) -> UserResult<User> {
        let id = input.id;
        let email = input.email.clone();
        let mut active_model: user::ActiveModel = input.into();
        active_model.created_at = sea_orm::ActiveValue::NotSet;
        active_model.updated_at = Set(Utc::now().into());

        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => UserError::NotFound(id),
            e if is_unique_violation(&e) => UserError::DuplicateEmail(email),
            e => UserError::Database(e),
        })?;

        tracing::info!(user_id = %id, "Updated user");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = user::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(result.rows_affected > 0)
    }

    async fn delete_non_admin(&self, id: Uuid) -> UserResult<bool> {
        let result = user::Entity::delete_many()
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::Role.ne(Role::Admin))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(result.rows_affected > 0)
    }

    async fn upsert_by_email(&self, input: User) -> UserResult<User> {
        let sql = r#"
            INSERT INTO users (id, email, password_hash, name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (email) DO UPDATE
                SET password_hash = EXCLUDED.password_hash,
                    name = EXCLUDED.name,
                    role = EXCLUDED.role
            RETURNING *
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                input.id.into(),
                input.email.clone().into(),
                input.password_hash.into(),
                input.name.into(),
                input.role.to_string().into(),
                input.created_at.into(),
            ],
        );

        let model = user::Model::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .ok_or_else(|| UserError::Internal(format!("Upsert of {} returned no row", input.email)))?;

        Ok(model.into())
    }
}

/// PostgreSQL implementation of RefreshTokenStore
#[derive(Clone)]
pub struct PgRefreshTokenStore {
    db: DatabaseConnection,
}

impl PgRefreshTokenStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn active_record(record: &RefreshTokenRecord) -> refresh_token::ActiveModel {
    refresh_token::ActiveModel {
        id: Set(record.id),
        user_id: Set(record.user_id),
        token_hash: Set(record.token_hash.clone()),
        expires_at: Set(record.expires_at.into()),
        ip_address: Set(record.ip_address.clone()),
        created_at: Set(record.created_at.into()),
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn issue(
        &self,
        user_id: Uuid,
        token: &str,
        ttl_secs: i64,
        ip_address: Option<String>,
    ) -> UserResult<RefreshTokenRecord> {
        let record = RefreshTokenRecord::new(user_id, token, ttl_secs, ip_address);
        let model = active_record(&record).insert(&self.db).await?;
        Ok(model.into())
    }

    async fn consume(&self, user_id: Uuid, token: &str) -> UserResult<Option<RefreshTokenRecord>> {
        // One statement: of two concurrent callers only one gets the row back
        let sql = r#"
            DELETE FROM refresh_tokens
            WHERE user_id = $1 AND token_hash = $2
            RETURNING *
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [user_id.into(), hash_token(token).into()],
        );

        let record: Option<RefreshTokenRecord> = refresh_token::Model::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(Into::into);

        Ok(record.filter(|r| !r.is_expired()))
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

        let txn = self.db.begin().await?;
        refresh_token::Entity::delete_by_id(old_id).exec(&txn).await?;
        let model = active_record(&record).insert(&txn).await?;
        txn.commit().await?;

        Ok(model.into())
    }

    async fn revoke_all(&self, user_id: Uuid) -> UserResult<u64> {
        let result = refresh_token::Entity::delete_many()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn revoke_one(&self, token: &str) -> UserResult<bool> {
        let result = refresh_token::Entity::delete_many()
            .filter(refresh_token::Column::TokenHash.eq(hash_token(token)))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn revoke_expired(&self) -> UserResult<u64> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "DELETE FROM refresh_tokens WHERE expires_at <= NOW()",
        );
        let removed = self.db.execute_raw(stmt).await?.rows_affected();

        if removed > 0 {
            tracing::info!(removed, "Swept expired refresh tokens");
        }
        Ok(removed)
    }
}

use crate::m20250101_000002_create_stores::Stores;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Staff::Table)
                    .if_not_exists()
                    .col(pk_uuid(Staff::Id))
                    .col(uuid(Staff::StoreId))
                    .col(string(Staff::Name))
                    .col(string(Staff::StaffId))
                    .col(string(Staff::PasswordHash))
                    .col(string(Staff::Role).default("staff"))
                    .col(boolean(Staff::IsActive).default(true))
                    .col(
                        timestamp_with_time_zone(Staff::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Staff::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_store_id")
                            .from(Staff::Table, Staff::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // staff_id repeats across stores, never within one
        manager
            .create_index(
                Index::create()
                    .name("idx_staff_store_id_staff_id")
                    .table(Staff::Table)
                    .col(Staff::StoreId)
                    .col(Staff::StaffId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER staff_touch_updated_at
                    BEFORE UPDATE ON staff
                    FOR EACH ROW
                    EXECUTE FUNCTION util.touch_updated_at()
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS staff_touch_updated_at ON staff")
            .await?;

        manager
            .drop_table(Table::drop().table(Staff::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Staff {
    Table,
    Id,
    StoreId,
    Name,
    StaffId,
    PasswordHash,
    Role,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

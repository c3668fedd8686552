pub use sea_orm_migration::prelude::*;

mod m20250101_000000_bootstrap;
mod m20250101_000001_create_users;
mod m20250101_000002_create_stores;
mod m20250101_000003_create_staff;
mod m20250101_000004_create_refresh_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000000_bootstrap::Migration),
            Box::new(m20250101_000001_create_users::Migration),
            Box::new(m20250101_000002_create_stores::Migration),
            Box::new(m20250101_000003_create_staff::Migration),
            Box::new(m20250101_000004_create_refresh_tokens::Migration),
        ]
    }
}

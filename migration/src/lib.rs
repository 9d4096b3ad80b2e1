pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_share_links;
mod m20260301_000002_share_link_access_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_share_links::Migration),
            Box::new(m20260301_000002_share_link_access_logs::Migration),
        ]
    }
}

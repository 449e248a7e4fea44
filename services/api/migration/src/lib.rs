pub use sea_orm_migration::prelude::*;

mod m20261014_000001_create_reference_tables;
mod m20261014_000002_create_users;
mod m20261014_000003_create_requests;
mod m20261014_000004_create_outbox_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261014_000001_create_reference_tables::Migration),
            Box::new(m20261014_000002_create_users::Migration),
            Box::new(m20261014_000003_create_requests::Migration),
            Box::new(m20261014_000004_create_outbox_events::Migration),
        ]
    }
}

pub use sea_orm_migration::prelude::*;

mod m20251004_000001_create_users;
mod m20251004_000002_create_pending_registrations;
mod m20251006_000001_create_user_profiles;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251004_000001_create_users::Migration),
            Box::new(m20251004_000002_create_pending_registrations::Migration),
            Box::new(m20251006_000001_create_user_profiles::Migration),
        ]
    }
}

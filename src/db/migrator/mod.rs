use sea_orm_migration::prelude::*;

mod m20260110_initial;
mod m20260125_drop_legacy_slug_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_initial::Migration),
            Box::new(m20260125_drop_legacy_slug_index::Migration),
        ]
    }
}

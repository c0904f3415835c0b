use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Early deployments carried a unique index on `slug` alone, which made a
/// slug taken by one user unavailable to every other user. The compound
/// `(user_id, slug)` index from the initial migration is the correct
/// constraint; this migration clears the legacy one out of old databases.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS \"idx-categories-slug\"")
            .await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // The legacy index was never correct; nothing to restore.
        Ok(())
    }
}

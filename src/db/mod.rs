use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::category::{CategoryRecord, CategoryRepoError};
pub use repositories::user::UserProfile;

use crate::entities::users;
use crate::portfolio::{Category, Entry};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: &str,
        two_factor_enabled: bool,
    ) -> Result<users::Model> {
        self.user_repo()
            .create(email, password_hash, name, role, two_factor_enabled)
            .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn update_user_password(&self, id: i32, new_hash: &str) -> Result<()> {
        self.user_repo().update_password(id, new_hash).await
    }

    pub async fn promote_user_to_admin(&self, id: i32, new_hash: &str) -> Result<()> {
        self.user_repo().promote_to_admin(id, new_hash).await
    }

    pub async fn reset_user_password(&self, id: i32, new_hash: &str) -> Result<()> {
        self.user_repo().reset_password(id, new_hash).await
    }

    pub async fn apply_email_change(&self, id: i32, new_email: &str) -> Result<users::Model> {
        self.user_repo().apply_email_change(id, new_email).await
    }

    pub async fn enable_two_factor(&self, id: i32) -> Result<()> {
        self.user_repo().enable_two_factor(id).await
    }

    pub async fn disable_two_factor(&self, id: i32) -> Result<()> {
        self.user_repo().disable_two_factor(id).await
    }

    pub async fn set_two_factor_code(&self, id: i32, code: &str, expiry: &str) -> Result<()> {
        self.user_repo().set_two_factor_code(id, code, expiry).await
    }

    pub async fn clear_two_factor_code(&self, id: i32) -> Result<()> {
        self.user_repo().clear_two_factor_code(id).await
    }

    pub async fn set_email_change_code(&self, id: i32, code: &str, expiry: &str) -> Result<()> {
        self.user_repo()
            .set_email_change_code(id, code, expiry)
            .await
    }

    pub async fn clear_email_change_code(&self, id: i32) -> Result<()> {
        self.user_repo().clear_email_change_code(id).await
    }

    pub async fn set_password_reset_code(&self, id: i32, code: &str, expiry: &str) -> Result<()> {
        self.user_repo()
            .set_password_reset_code(id, code, expiry)
            .await
    }

    pub async fn clear_password_reset_code(&self, id: i32) -> Result<()> {
        self.user_repo().clear_password_reset_code(id).await
    }

    // ========== Category Repository Methods ==========

    pub async fn list_categories(&self, user_id: i32) -> Result<Vec<Category>, CategoryRepoError> {
        self.category_repo().list_for_user(user_id).await
    }

    pub async fn find_category(
        &self,
        user_id: i32,
        slug: &str,
    ) -> Result<Option<Category>, CategoryRepoError> {
        self.category_repo().find(user_id, slug).await
    }

    pub async fn create_category(
        &self,
        user_id: i32,
        record: &CategoryRecord,
    ) -> Result<Category, CategoryRepoError> {
        self.category_repo().insert(user_id, record).await
    }

    pub async fn update_category(
        &self,
        user_id: i32,
        slug: &str,
        record: &CategoryRecord,
    ) -> Result<Option<Category>, CategoryRepoError> {
        self.category_repo().update(user_id, slug, record).await
    }

    pub async fn save_category_entries(
        &self,
        user_id: i32,
        slug: &str,
        entries: &[Entry],
        current_value: f64,
    ) -> Result<Option<Category>, CategoryRepoError> {
        self.category_repo()
            .save_entries(user_id, slug, entries, current_value)
            .await
    }

    pub async fn delete_category(
        &self,
        user_id: i32,
        slug: &str,
    ) -> Result<Option<Category>, CategoryRepoError> {
        self.category_repo().delete(user_id, slug).await
    }

    pub async fn count_categories(&self) -> Result<u64, CategoryRepoError> {
        self.category_repo().count().await
    }
}

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

/// User data safe to hand to callers (no hash, no pending codes).
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
    pub two_factor_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for UserProfile {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            two_factor_enabled: model.two_factor_enabled,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user. Email must already be normalized to lowercase.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: &str,
        two_factor_enabled: bool,
    ) -> Result<users::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let user = users::ActiveModel {
            id: NotSet,
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            name: Set(name.to_string()),
            role: Set(role.to_string()),
            two_factor_enabled: Set(two_factor_enabled),
            two_factor_code: Set(None),
            two_factor_code_expiry: Set(None),
            email_change_code: Set(None),
            email_change_expiry: Set(None),
            password_reset_code: Set(None),
            password_reset_expiry: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        user.insert(&self.conn).await.context("Failed to insert user")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn count(&self) -> Result<u64> {
        users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }

    pub async fn update_password(&self, id: i32, new_hash: &str) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.password_hash = Set(new_hash.to_string());
        active.update(&self.conn).await?;
        Ok(())
    }

    /// Promote an existing account to admin, replacing its password hash
    /// in the same update.
    pub async fn promote_to_admin(&self, id: i32, new_hash: &str) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.role = Set("admin".to_string());
        active.password_hash = Set(new_hash.to_string());
        active.update(&self.conn).await?;
        Ok(())
    }

    /// Apply a verified password reset: replace the hash and clear the
    /// pending code in the same update.
    pub async fn reset_password(&self, id: i32, new_hash: &str) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.password_hash = Set(new_hash.to_string());
        active.password_reset_code = Set(None);
        active.password_reset_expiry = Set(None);
        active.update(&self.conn).await?;
        Ok(())
    }

    /// Apply a verified email change: replace the address and clear the
    /// pending code in the same update. The new address must be lowercase.
    pub async fn apply_email_change(&self, id: i32, new_email: &str) -> Result<users::Model> {
        let mut active = self.active_for(id).await?;
        active.email = Set(new_email.to_string());
        active.email_change_code = Set(None);
        active.email_change_expiry = Set(None);
        Ok(active.update(&self.conn).await?)
    }

    /// Apply a verified 2FA enrollment: set the flag and clear the code.
    pub async fn enable_two_factor(&self, id: i32) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.two_factor_enabled = Set(true);
        active.two_factor_code = Set(None);
        active.two_factor_code_expiry = Set(None);
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn disable_two_factor(&self, id: i32) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.two_factor_enabled = Set(false);
        active.two_factor_code = Set(None);
        active.two_factor_code_expiry = Set(None);
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn set_two_factor_code(&self, id: i32, code: &str, expiry: &str) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.two_factor_code = Set(Some(code.to_string()));
        active.two_factor_code_expiry = Set(Some(expiry.to_string()));
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn clear_two_factor_code(&self, id: i32) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.two_factor_code = Set(None);
        active.two_factor_code_expiry = Set(None);
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn set_email_change_code(&self, id: i32, code: &str, expiry: &str) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.email_change_code = Set(Some(code.to_string()));
        active.email_change_expiry = Set(Some(expiry.to_string()));
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn clear_email_change_code(&self, id: i32) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.email_change_code = Set(None);
        active.email_change_expiry = Set(None);
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn set_password_reset_code(&self, id: i32, code: &str, expiry: &str) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.password_reset_code = Set(Some(code.to_string()));
        active.password_reset_expiry = Set(Some(expiry.to_string()));
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn clear_password_reset_code(&self, id: i32) -> Result<()> {
        let mut active = self.active_for(id).await?;
        active.password_reset_code = Set(None);
        active.password_reset_expiry = Set(None);
        active.update(&self.conn).await?;
        Ok(())
    }

    /// Load a user and prepare an `ActiveModel` with `updated_at` bumped.
    async fn active_for(&self, id: i32) -> Result<users::ActiveModel> {
        let user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        Ok(active)
    }
}

/// Verify a password against a stored hash.
/// Note: This uses `spawn_blocking` because Argon2 verification is
/// CPU-intensive and would block the async runtime if run directly.
pub async fn verify_password(password_hash: String, password: String) -> Result<bool> {
    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        let argon2 = Argon2::default();
        Ok::<bool, anyhow::Error>(
            argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

/// Hash a password on a blocking thread with the configured Argon2 params.
pub async fn hash_password_async(
    password: String,
    config: Option<SecurityConfig>,
) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password, config.as_ref()))
        .await
        .context("Password hashing task panicked")?
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use thiserror::Error;

use crate::entities::categories;
use crate::portfolio::{Category, Entry};

/// Errors surfaced by category storage. `DuplicateSlug` is typed so the
/// service layer can report it distinctly from plain database failures.
#[derive(Debug, Error)]
pub enum CategoryRepoError {
    #[error("duplicate slug for this user")]
    DuplicateSlug,

    #[error("corrupt entry list: {0}")]
    CorruptEntries(#[from] serde_json::Error),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

/// The mutable columns of a category row, as the service wants them stored.
#[derive(Debug, Clone)]
pub struct CategoryRecord {
    pub name: String,
    pub slug: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub expected_percent: f64,
    pub current_value: f64,
    pub entries: Vec<Entry>,
}

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Category>, CategoryRepoError> {
        let rows = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::Name)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(decode).collect()
    }

    pub async fn find(
        &self,
        user_id: i32,
        slug: &str,
    ) -> Result<Option<Category>, CategoryRepoError> {
        let row = self.find_row(user_id, slug).await?;
        row.map(decode).transpose()
    }

    pub async fn count(&self) -> Result<u64, CategoryRepoError> {
        Ok(categories::Entity::find().count(&self.conn).await?)
    }

    /// Insert a new category.
    ///
    /// A unique violation on the compound `(user_id, slug)` index means the
    /// caller really does own this slug already. A violation with no
    /// same-owner row behind it can only come from a leftover single-column
    /// slug index out of an old schema; that index is dropped and the insert
    /// retried once rather than surfacing the conflict to the user.
    pub async fn insert(
        &self,
        user_id: i32,
        record: &CategoryRecord,
    ) -> Result<Category, CategoryRepoError> {
        match self.try_insert(user_id, record).await {
            Ok(category) => Ok(category),
            Err(CategoryRepoError::Db(err)) if is_unique_violation(&err) => {
                if self.find_row(user_id, &record.slug).await?.is_some() {
                    return Err(CategoryRepoError::DuplicateSlug);
                }

                tracing::warn!(
                    slug = %record.slug,
                    "Unique violation without a same-owner duplicate; dropping legacy slug index and retrying"
                );
                self.drop_legacy_slug_index().await?;
                self.try_insert(user_id, record).await
            }
            Err(err) => Err(err),
        }
    }

    /// Overwrite the mutable columns of an existing category. Returns
    /// `Ok(None)` when the caller owns no category under `slug`.
    pub async fn update(
        &self,
        user_id: i32,
        slug: &str,
        record: &CategoryRecord,
    ) -> Result<Option<Category>, CategoryRepoError> {
        let Some(row) = self.find_row(user_id, slug).await? else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = row.into();
        active.name = Set(record.name.clone());
        active.slug = Set(record.slug.clone());
        active.display_name = Set(record.display_name.clone());
        active.description = Set(record.description.clone());
        active.expected_percent = Set(record.expected_percent);
        active.current_value = Set(record.current_value);
        active.entries = Set(serde_json::to_value(&record.entries)?);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        match active.update(&self.conn).await {
            Ok(updated) => Ok(Some(decode(updated)?)),
            Err(err) if is_unique_violation(&err) => Err(CategoryRepoError::DuplicateSlug),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist a mutated entry list together with its recomputed aggregate.
    pub async fn save_entries(
        &self,
        user_id: i32,
        slug: &str,
        entries: &[Entry],
        current_value: f64,
    ) -> Result<Option<Category>, CategoryRepoError> {
        let Some(row) = self.find_row(user_id, slug).await? else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = row.into();
        active.entries = Set(serde_json::to_value(entries)?);
        active.current_value = Set(current_value);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(decode(updated)?))
    }

    pub async fn delete(
        &self,
        user_id: i32,
        slug: &str,
    ) -> Result<Option<Category>, CategoryRepoError> {
        let Some(row) = self.find_row(user_id, slug).await? else {
            return Ok(None);
        };

        let category = decode(row.clone())?;
        categories::Entity::delete_by_id(row.id)
            .exec(&self.conn)
            .await?;

        Ok(Some(category))
    }

    async fn try_insert(
        &self,
        user_id: i32,
        record: &CategoryRecord,
    ) -> Result<Category, CategoryRepoError> {
        let now = chrono::Utc::now().to_rfc3339();

        let category = categories::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            name: Set(record.name.clone()),
            slug: Set(record.slug.clone()),
            display_name: Set(record.display_name.clone()),
            description: Set(record.description.clone()),
            expected_percent: Set(record.expected_percent),
            current_value: Set(record.current_value),
            entries: Set(serde_json::to_value(&record.entries)?),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        decode(category.insert(&self.conn).await?)
    }

    async fn find_row(
        &self,
        user_id: i32,
        slug: &str,
    ) -> Result<Option<categories::Model>, sea_orm::DbErr> {
        categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
    }

    async fn drop_legacy_slug_index(&self) -> Result<(), sea_orm::DbErr> {
        self.conn
            .execute_unprepared("DROP INDEX IF EXISTS \"idx-categories-slug\"")
            .await?;
        Ok(())
    }
}

fn decode(model: categories::Model) -> Result<Category, CategoryRepoError> {
    let entries: Vec<Entry> = serde_json::from_value(model.entries)?;

    Ok(Category {
        name: model.name,
        slug: model.slug,
        display_name: model.display_name,
        description: model.description,
        expected_percent: model.expected_percent,
        current_value: model.current_value,
        entries,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

//! Domain service for categories and their entries.
//!
//! Owns slug handling and the aggregate-recomputation rule: every entry
//! mutation rewrites the category's stored `current_value` as the sum of
//! the entries' explicit current values before persisting.

use thiserror::Error;

use crate::db::CategoryRepoError;
use crate::portfolio::Category;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("Category not found")]
    NotFound,

    #[error("You already have a category with this slug. Please choose a different name or slug.")]
    DuplicateSlug,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CategoryRepoError> for PortfolioError {
    fn from(err: CategoryRepoError) -> Self {
        match err {
            CategoryRepoError::DuplicateSlug => Self::DuplicateSlug,
            CategoryRepoError::CorruptEntries(e) => Self::Internal(e.to_string()),
            CategoryRepoError::Db(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for category creation. The slug falls back to the name when not
/// supplied; both go through normalization.
#[derive(Debug, Clone, Default)]
pub struct NewCategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub expected_percent: Option<f64>,
    pub current_value: Option<f64>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// Partial category update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdateInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub expected_percent: Option<f64>,
    pub current_value: Option<f64>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEntryInput {
    pub name: String,
    pub quantity: f64,
    pub invested: f64,
    /// Stored verbatim when present — an explicit zero is kept distinct
    /// from "unset".
    pub current_value: Option<f64>,
    pub expected_percent: Option<f64>,
}

/// Partial entry update addressed by position. The nested options carry
/// the absent / explicit-null / explicit-value distinction through from
/// the wire: `None` leaves the field alone, `Some(None)` clears it,
/// `Some(Some(v))` sets it.
#[derive(Debug, Clone)]
pub struct EntryUpdateInput {
    pub entry_index: usize,
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub invested: Option<f64>,
    pub current_value: Option<Option<f64>>,
    pub expected_percent: Option<Option<f64>>,
}

/// Domain service trait for portfolio categories.
#[async_trait::async_trait]
pub trait PortfolioService: Send + Sync {
    async fn list_categories(&self, user_id: i32) -> Result<Vec<Category>, PortfolioError>;

    async fn create_category(
        &self,
        user_id: i32,
        input: NewCategoryInput,
    ) -> Result<Category, PortfolioError>;

    async fn get_category(&self, user_id: i32, slug: &str) -> Result<Category, PortfolioError>;

    async fn update_category(
        &self,
        user_id: i32,
        slug: &str,
        input: CategoryUpdateInput,
    ) -> Result<Category, PortfolioError>;

    /// Deletes the category wholesale and returns its last state.
    async fn delete_category(&self, user_id: i32, slug: &str) -> Result<Category, PortfolioError>;

    async fn add_entry(
        &self,
        user_id: i32,
        slug: &str,
        input: NewEntryInput,
    ) -> Result<Category, PortfolioError>;

    async fn update_entry(
        &self,
        user_id: i32,
        slug: &str,
        input: EntryUpdateInput,
    ) -> Result<Category, PortfolioError>;

    async fn delete_entry(
        &self,
        user_id: i32,
        slug: &str,
        entry_index: usize,
    ) -> Result<Category, PortfolioError>;

    /// Full-portfolio CSV export (see `portfolio::export`).
    async fn export_csv(&self, user_id: i32) -> Result<String, PortfolioError>;
}

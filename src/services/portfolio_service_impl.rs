//! `SeaORM` implementation of the `PortfolioService` trait.

use async_trait::async_trait;

use crate::db::{CategoryRecord, Store};
use crate::portfolio::{Category, Entry, export, slug, valuation};
use crate::services::portfolio_service::{
    CategoryUpdateInput, EntryUpdateInput, NewCategoryInput, NewEntryInput, PortfolioError,
    PortfolioService,
};

pub struct SeaOrmPortfolioService {
    store: Store,
}

impl SeaOrmPortfolioService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn require_category(
        &self,
        user_id: i32,
        slug: &str,
    ) -> Result<Category, PortfolioError> {
        self.store
            .find_category(user_id, slug)
            .await?
            .ok_or(PortfolioError::NotFound)
    }

    /// Write back a mutated entry list with its aggregate recomputed from
    /// the entries' explicit current values.
    async fn persist_entries(
        &self,
        user_id: i32,
        slug: &str,
        entries: Vec<Entry>,
    ) -> Result<Category, PortfolioError> {
        let current_value = valuation::aggregate_current_value(&entries);
        self.store
            .save_category_entries(user_id, slug, &entries, current_value)
            .await?
            .ok_or(PortfolioError::NotFound)
    }
}

#[async_trait]
impl PortfolioService for SeaOrmPortfolioService {
    async fn list_categories(&self, user_id: i32) -> Result<Vec<Category>, PortfolioError> {
        Ok(self.store.list_categories(user_id).await?)
    }

    async fn create_category(
        &self,
        user_id: i32,
        input: NewCategoryInput,
    ) -> Result<Category, PortfolioError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(PortfolioError::Validation("Name is required".to_string()));
        }

        let raw_slug = input
            .slug
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&name);
        let normalized = slug::normalize(raw_slug);
        if normalized.is_empty() {
            return Err(PortfolioError::Validation(
                "Invalid slug. Please provide a valid category name or slug.".to_string(),
            ));
        }

        // The compound unique index is the backstop for the race window.
        if self.store.find_category(user_id, &normalized).await?.is_some() {
            return Err(PortfolioError::DuplicateSlug);
        }

        let record = CategoryRecord {
            display_name: Some(input.display_name.unwrap_or_else(|| name.clone())),
            description: input.description,
            slug: normalized,
            expected_percent: input
                .expected_percent
                .unwrap_or(valuation::DEFAULT_CATEGORY_EXPECTED_PERCENT),
            current_value: input.current_value.unwrap_or(0.0),
            entries: Vec::new(),
            name,
        };

        let created = self.store.create_category(user_id, &record).await?;
        tracing::info!(user_id, slug = %created.slug, "Category created");
        Ok(created)
    }

    async fn get_category(&self, user_id: i32, slug: &str) -> Result<Category, PortfolioError> {
        self.require_category(user_id, slug).await
    }

    async fn update_category(
        &self,
        user_id: i32,
        slug: &str,
        input: CategoryUpdateInput,
    ) -> Result<Category, PortfolioError> {
        let existing = self.require_category(user_id, slug).await?;

        let new_slug = match input.slug {
            Some(raw) if slug::normalize(&raw) != existing.slug => {
                let normalized = slug::normalize(&raw);
                if normalized.is_empty() {
                    return Err(PortfolioError::Validation(
                        "Invalid slug. Please provide a valid slug.".to_string(),
                    ));
                }
                if self.store.find_category(user_id, &normalized).await?.is_some() {
                    return Err(PortfolioError::DuplicateSlug);
                }
                normalized
            }
            _ => existing.slug.clone(),
        };

        let record = CategoryRecord {
            name: input.name.unwrap_or(existing.name),
            slug: new_slug,
            display_name: input.display_name.or(existing.display_name),
            description: input.description.or(existing.description),
            expected_percent: input.expected_percent.unwrap_or(existing.expected_percent),
            current_value: input.current_value.unwrap_or(existing.current_value),
            entries: existing.entries,
        };

        self.store
            .update_category(user_id, slug, &record)
            .await?
            .ok_or(PortfolioError::NotFound)
    }

    async fn delete_category(&self, user_id: i32, slug: &str) -> Result<Category, PortfolioError> {
        let deleted = self
            .store
            .delete_category(user_id, slug)
            .await?
            .ok_or(PortfolioError::NotFound)?;

        tracing::info!(user_id, slug, "Category deleted");
        Ok(deleted)
    }

    async fn add_entry(
        &self,
        user_id: i32,
        slug: &str,
        input: NewEntryInput,
    ) -> Result<Category, PortfolioError> {
        if input.name.trim().is_empty() {
            return Err(PortfolioError::Validation(
                "Name, quantity, and invested are required".to_string(),
            ));
        }

        let category = self.require_category(user_id, slug).await?;

        let mut entries = category.entries;
        entries.push(Entry {
            name: input.name,
            quantity: input.quantity,
            invested: input.invested,
            current_value: input.current_value,
            expected_percent: Some(
                input
                    .expected_percent
                    .unwrap_or(valuation::DEFAULT_ENTRY_EXPECTED_PERCENT),
            ),
        });

        self.persist_entries(user_id, slug, entries).await
    }

    async fn update_entry(
        &self,
        user_id: i32,
        slug: &str,
        input: EntryUpdateInput,
    ) -> Result<Category, PortfolioError> {
        let category = self.require_category(user_id, slug).await?;

        let mut entries = category.entries;
        let Some(entry) = entries.get_mut(input.entry_index) else {
            return Err(PortfolioError::Validation("Invalid entry index".to_string()));
        };

        if let Some(name) = input.name {
            entry.name = name;
        }
        if let Some(quantity) = input.quantity {
            entry.quantity = quantity;
        }
        if let Some(invested) = input.invested {
            entry.invested = invested;
        }
        if let Some(current_value) = input.current_value {
            entry.current_value = current_value;
        }
        if let Some(expected_percent) = input.expected_percent {
            entry.expected_percent = expected_percent;
        }

        self.persist_entries(user_id, slug, entries).await
    }

    async fn delete_entry(
        &self,
        user_id: i32,
        slug: &str,
        entry_index: usize,
    ) -> Result<Category, PortfolioError> {
        let category = self.require_category(user_id, slug).await?;

        let mut entries = category.entries;
        if entry_index >= entries.len() {
            return Err(PortfolioError::Validation("Invalid entry index".to_string()));
        }
        entries.remove(entry_index);

        self.persist_entries(user_id, slug, entries).await
    }

    async fn export_csv(&self, user_id: i32) -> Result<String, PortfolioError> {
        let categories = self.store.list_categories(user_id).await?;
        Ok(export::to_csv(&categories))
    }
}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning user. Uniqueness of (user_id, slug) is enforced by a
    /// compound index created in the initial migration.
    pub user_id: i32,

    pub name: String,

    /// Lowercase, alphanumeric-with-dashes, no leading/trailing dash.
    pub slug: String,

    pub display_name: Option<String>,

    pub description: Option<String>,

    /// Category-level target return percentage.
    pub expected_percent: f64,

    /// Denormalized sum of the entries' explicit current values,
    /// recomputed on every entry mutation.
    pub current_value: f64,

    /// JSON array of entries. Keeping the list on the category row makes
    /// entry-list mutations single-row atomic.
    pub entries: Json,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

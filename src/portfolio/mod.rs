//! Portfolio domain core: slug normalization, aggregate valuation math,
//! and the CSV export encoder. Pure logic, no I/O.

pub mod export;
pub mod slug;
pub mod valuation;

use serde::{Deserialize, Serialize};

/// One holding inside a category.
///
/// `current_value` and `expected_percent` are genuinely optional: an absent
/// value means "unknown", which is distinct from an explicit zero. The
/// distinction drives both aggregate recomputation and the proportional
/// display fallback in [`valuation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,

    pub quantity: f64,

    pub invested: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_percent: Option<f64>,
}

/// A category with its decoded entry list, as handed out by the store.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub slug: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub expected_percent: f64,
    pub current_value: f64,
    pub entries: Vec<Entry>,
    pub created_at: String,
    pub updated_at: String,
}

//! Derived valuation math for categories and entries.
//!
//! The stored aggregate (`Category::current_value`) is the sum of the
//! entries' *explicit* current values; everything else here is computed on
//! demand and never persisted.

use super::Entry;

/// Default target return for a category when none is given.
pub const DEFAULT_CATEGORY_EXPECTED_PERCENT: f64 = 15.0;

/// Default target return for an entry without an explicit percentage.
pub const DEFAULT_ENTRY_EXPECTED_PERCENT: f64 = 10.0;

/// Sum of the amounts invested across all entries.
#[must_use]
pub fn total_invested(entries: &[Entry]) -> f64 {
    entries.iter().map(|e| e.invested).sum()
}

/// Sum of the entries' explicitly set current values.
///
/// An entry without an explicit current value contributes nothing; an
/// explicit zero contributes zero. This is the value written back to the
/// category row on every entry mutation.
#[must_use]
pub fn aggregate_current_value(entries: &[Entry]) -> f64 {
    entries.iter().filter_map(|e| e.current_value).sum()
}

/// The effective target return for an entry.
#[must_use]
pub fn entry_expected_percent(entry: &Entry) -> f64 {
    entry
        .expected_percent
        .unwrap_or(DEFAULT_ENTRY_EXPECTED_PERCENT)
}

/// Projected value of an investment at the given target return.
#[must_use]
pub fn expected_value(invested: f64, percent: f64) -> f64 {
    invested * (1.0 + percent / 100.0)
}

/// Invested-weighted average of the entries' target returns, or the flat
/// entry default when nothing is invested yet.
#[must_use]
pub fn weighted_expected_percent(entries: &[Entry]) -> f64 {
    let total = total_invested(entries);
    if total <= 0.0 {
        return DEFAULT_ENTRY_EXPECTED_PERCENT;
    }

    entries
        .iter()
        .map(|e| e.invested * entry_expected_percent(e))
        .sum::<f64>()
        / total
}

/// Current value to display for an entry: the explicit value when set,
/// otherwise the entry's proportional share of the category's aggregate.
/// The fallback keeps entries created before per-entry tracking rendering
/// a sensible figure.
#[must_use]
pub fn display_current_value(entry: &Entry, total_invested: f64, category_current: f64) -> f64 {
    if let Some(value) = entry.current_value {
        return value;
    }
    if total_invested <= 0.0 {
        return 0.0;
    }
    entry.invested / total_invested * category_current
}

/// Profit or loss, at either entry or category granularity.
#[must_use]
pub fn profit_loss(current_value: f64, invested: f64) -> f64 {
    current_value - invested
}

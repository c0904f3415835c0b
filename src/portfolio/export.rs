//! CSV export of the full portfolio.
//!
//! One row per entry, with the category-level columns populated only on a
//! category's first row; a category without entries still produces one row.
//! Monetary columns use Indian digit grouping without decimals.

use super::{Category, valuation};

const HEADERS: [&str; 12] = [
    "Category Name",
    "Display Name",
    "Slug",
    "Expected %",
    "Total Invested (INR)",
    "Expected Amount (INR)",
    "Current Value (INR)",
    "Profit/Loss (INR)",
    "Profit/Loss %",
    "Entry Name",
    "Entry Quantity",
    "Entry Invested (INR)",
];

/// Render all categories as a CSV document, prefixed with a UTF-8 BOM so
/// spreadsheet applications pick up the encoding.
#[must_use]
pub fn to_csv(categories: &[Category]) -> String {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(categories.len() + 1);
    rows.push(HEADERS.iter().map(ToString::to_string).collect());

    for category in categories {
        let total_invested = valuation::total_invested(&category.entries);
        let expected_amount = valuation::expected_value(total_invested, category.expected_percent);
        let profit_loss = valuation::profit_loss(category.current_value, total_invested);
        let profit_loss_percent = if total_invested > 0.0 {
            profit_loss / total_invested * 100.0
        } else {
            0.0
        };

        let category_columns = [
            category.name.clone(),
            category.display_name.clone().unwrap_or_default(),
            category.slug.clone(),
            format_percent(category.expected_percent),
            format_inr(total_invested),
            format_inr(expected_amount),
            format_inr(category.current_value),
            format_inr(profit_loss),
            format!("{profit_loss_percent:.2}%"),
        ];

        if category.entries.is_empty() {
            let mut row: Vec<String> = category_columns.to_vec();
            row.extend([String::new(), String::new(), String::new()]);
            rows.push(row);
            continue;
        }

        for (index, entry) in category.entries.iter().enumerate() {
            let mut row: Vec<String> = if index == 0 {
                category_columns.to_vec()
            } else {
                vec![String::new(); category_columns.len()]
            };
            row.push(entry.name.clone());
            row.push(format_number(entry.quantity));
            row.push(format_inr(entry.invested));
            rows.push(row);
        }
    }

    let body = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|field| escape_field(field))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("\u{feff}{body}\n")
}

/// Indian digit grouping: last three digits, then groups of two
/// (e.g. 1234567 -> "12,34,567"). Rounded to whole rupees.
fn format_inr(value: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = value.round() as i64;
    let negative = rounded < 0;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 2);
    let bytes = digits.as_bytes();
    let len = bytes.len();

    for (i, b) in bytes.iter().enumerate() {
        let remaining = len - i;
        if i > 0 && remaining >= 3 && (remaining - 3) % 2 == 0 {
            grouped.push(',');
        }
        grouped.push(*b as char);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn format_percent(value: f64) -> String {
    format_number(value)
}

/// Trim a float to a plain decimal representation without a trailing ".0".
fn format_number(value: f64) -> String {
    if (value - value.trunc()).abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::Entry;

    fn category(name: &str, slug: &str, current: f64, entries: Vec<Entry>) -> Category {
        Category {
            name: name.to_string(),
            slug: slug.to_string(),
            display_name: Some(name.to_string()),
            description: None,
            expected_percent: 15.0,
            current_value: current,
            entries,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_inr_grouping() {
        assert_eq!(format_inr(0.0), "0");
        assert_eq!(format_inr(999.0), "999");
        assert_eq!(format_inr(1000.0), "1,000");
        assert_eq!(format_inr(123_456.0), "1,23,456");
        assert_eq!(format_inr(1_234_567.0), "12,34,567");
        assert_eq!(format_inr(-54_321.0), "-54,321");
    }

    #[test]
    fn test_inr_rounds_to_whole_rupees() {
        assert_eq!(format_inr(1234.56), "1,235");
    }

    #[test]
    fn test_header_row_and_bom() {
        let csv = to_csv(&[]);
        assert!(csv.starts_with('\u{feff}'));
        assert!(csv.contains("Category Name,Display Name,Slug,Expected %"));
    }

    #[test]
    fn test_category_columns_only_on_first_row() {
        let entries = vec![
            Entry {
                name: "TCS".to_string(),
                quantity: 10.0,
                invested: 1000.0,
                current_value: Some(1200.0),
                expected_percent: None,
            },
            Entry {
                name: "Infosys".to_string(),
                quantity: 5.0,
                invested: 500.0,
                current_value: None,
                expected_percent: None,
            },
        ];
        let csv = to_csv(&[category("Stocks", "stocks", 1200.0, entries)]);
        let lines: Vec<&str> = csv.trim_end().lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Stocks,Stocks,stocks,15,"));
        assert!(lines[1].contains("TCS,10,\"1,000\""));
        assert!(lines[2].starts_with(",,,,,,,,,"));
        assert!(lines[2].contains("Infosys"));
    }

    #[test]
    fn test_empty_category_still_exported() {
        let csv = to_csv(&[category("Gold", "gold", 0.0, vec![])]);
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Gold,Gold,gold,15,0,0,0,0,0.00%"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let entries = vec![Entry {
            name: "Bonds, short term".to_string(),
            quantity: 1.0,
            invested: 100.0,
            current_value: None,
            expected_percent: None,
        }];
        let csv = to_csv(&[category("Debt", "debt", 0.0, entries)]);
        assert!(csv.contains("\"Bonds, short term\""));
    }
}

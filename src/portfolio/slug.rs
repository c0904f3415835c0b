/// Normalize a raw category name or slug into its canonical URL-safe form:
/// lowercase, every run of characters outside `[a-z0-9]` collapsed into a
/// single dash, no leading or trailing dash.
///
/// Returns an empty string when nothing survives normalization; callers
/// treat that as a validation error.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for c in raw.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_normalization() {
        assert_eq!(normalize("Stocks"), "stocks");
        assert_eq!(normalize("Mutual Funds"), "mutual-funds");
        assert_eq!(normalize("  Fixed Deposits  "), "fixed-deposits");
    }

    #[test]
    fn test_collapses_special_runs() {
        assert_eq!(normalize("US -- Equity!!"), "us-equity");
        assert_eq!(normalize("a___b...c"), "a-b-c");
        assert_eq!(normalize("REITs & InvITs"), "reits-invits");
    }

    #[test]
    fn test_strips_edge_dashes() {
        assert_eq!(normalize("--gold--"), "gold");
        assert_eq!(normalize("!@#crypto#@!"), "crypto");
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["Stocks", "US -- Equity!!", "--gold--", "Ppf & Epf 2024"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }
}

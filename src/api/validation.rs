use std::sync::LazyLock;

use regex::Regex;

use super::ApiError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Validate and normalize an email address (trimmed, lowercase).
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let normalized = email.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    if !EMAIL_RE.is_match(&normalized) {
        return Err(ApiError::validation("Invalid email format"));
    }

    Ok(normalized)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    Ok(password)
}

pub fn validate_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("a@x.com").unwrap(), "a@x.com");
        assert_eq!(validate_email("  A@X.COM  ").unwrap(), "a@x.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("two words@x.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Asha  ").unwrap(), "Asha");
        assert!(validate_name("   ").is_err());
    }
}

use serde::{Deserialize, Deserializer, Serialize};

use crate::db::UserProfile;
use crate::portfolio::{Category, Entry, valuation};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Deserialize helper distinguishing an absent field from an explicit
/// `null`: absent stays `None` (via `#[serde(default)]`), `null` becomes
/// `Some(None)`, a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
    pub two_factor_enabled: bool,
}

impl From<UserProfile> for UserDto {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            role: profile.role,
            two_factor_enabled: profile.two_factor_enabled,
        }
    }
}

/// `data` payload wrapping the user object, matching the wire shape the
/// frontend expects (`data.user`).
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Sign-in response for the 2FA short-circuit: credentials were accepted
/// but no session is issued until the emailed code comes back.
#[derive(Debug, Serialize)]
pub struct TwoFactorChallengeResponse {
    pub success: bool,
    #[serde(rename = "requires2FA")]
    pub requires_2fa: bool,
    pub message: String,
}

impl TwoFactorChallengeResponse {
    #[must_use]
    pub fn new() -> Self {
        Self {
            success: false,
            requires_2fa: true,
            message: "Two-factor authentication code sent to your email".to_string(),
        }
    }
}

impl Default for TwoFactorChallengeResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDto {
    pub name: String,
    pub quantity: f64,
    pub invested: f64,

    /// Explicit stored value; absent when the entry has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_percent: Option<f64>,

    // Derived fields, computed per request.
    pub display_current_value: f64,
    pub expected_value: f64,
    pub profit_loss: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub expected_percent: f64,
    pub current_value: f64,

    // Derived fields, computed per request.
    pub total_invested: f64,
    pub expected_value: f64,
    pub weighted_expected_percent: f64,
    pub profit_loss: f64,

    pub entries: Vec<EntryDto>,

    pub created_at: String,
    pub updated_at: String,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        let total_invested = valuation::total_invested(&category.entries);

        let entries = category
            .entries
            .iter()
            .map(|entry| entry_dto(entry, total_invested, category.current_value))
            .collect();

        Self {
            total_invested,
            expected_value: valuation::expected_value(total_invested, category.expected_percent),
            weighted_expected_percent: valuation::weighted_expected_percent(&category.entries),
            profit_loss: valuation::profit_loss(category.current_value, total_invested),
            name: category.name,
            slug: category.slug,
            display_name: category.display_name,
            description: category.description,
            expected_percent: category.expected_percent,
            current_value: category.current_value,
            entries,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

fn entry_dto(entry: &Entry, total_invested: f64, category_current: f64) -> EntryDto {
    let percent = valuation::entry_expected_percent(entry);
    let display = valuation::display_current_value(entry, total_invested, category_current);

    EntryDto {
        name: entry.name.clone(),
        quantity: entry.quantity,
        invested: entry.invested,
        current_value: entry.current_value,
        expected_percent: entry.expected_percent,
        display_current_value: display,
        expected_value: valuation::expected_value(entry.invested, percent),
        profit_loss: valuation::profit_loss(display, entry.invested),
    }
}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored lowercase; uniqueness is enforced here.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub name: String,

    /// "admin" or "user"
    pub role: String,

    pub two_factor_enabled: bool,

    /// Pending 2FA one-time code (6 digits), if any.
    pub two_factor_code: Option<String>,

    /// RFC 3339 expiry for the pending 2FA code.
    pub two_factor_code_expiry: Option<String>,

    /// Pending email-change verification code, if any.
    pub email_change_code: Option<String>,

    pub email_change_expiry: Option<String>,

    /// Pending password-reset code, if any.
    pub password_reset_code: Option<String>,

    pub password_reset_expiry: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Domain service for authentication and account management.
//!
//! Covers signup, credential sign-in with the optional 2FA challenge, and
//! the email one-time-code flows (2FA enrollment, email change, password
//! reset). All code flows share the same life cycle: a pending code with an
//! absolute expiry, cleared on success or on an expired attempt, left
//! intact on a mismatch so the caller can retry.

use thiserror::Error;

use crate::db::UserProfile;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No verification code found. Please request a new code.")]
    CodeMissing,

    #[error("Verification code has expired. Please request a new code.")]
    CodeExpired,

    #[error("Invalid verification code")]
    CodeInvalid,

    #[error("Failed to send email: {0}")]
    EmailDelivery(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of a credential sign-in attempt.
#[derive(Debug)]
pub enum SigninOutcome {
    /// Credentials (and code, when required) verified; a session may be
    /// issued for this user.
    SignedIn(UserProfile),

    /// Credentials verified but the account requires 2FA and no code was
    /// supplied; a fresh code has been emailed.
    ChallengeSent,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a new account. 2FA is enabled by default; `role` becomes
    /// "admin" only when explicitly requested.
    async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Option<&str>,
    ) -> Result<UserProfile, AuthError>;

    /// Verifies credentials and, when the account has 2FA enabled,
    /// composes the one-time-code challenge (see [`SigninOutcome`]).
    async fn signin(
        &self,
        email: &str,
        password: &str,
        code: Option<&str>,
    ) -> Result<SigninOutcome, AuthError>;

    async fn current_user(&self, user_id: i32) -> Result<UserProfile, AuthError>;

    /// Sends an enrollment code; the 2FA flag is only set by
    /// [`Self::confirm_two_factor_enrollment`].
    async fn begin_two_factor_enrollment(&self, user_id: i32) -> Result<(), AuthError>;

    async fn confirm_two_factor_enrollment(
        &self,
        user_id: i32,
        code: &str,
    ) -> Result<(), AuthError>;

    async fn disable_two_factor(&self, user_id: i32) -> Result<(), AuthError>;

    /// Pre-session code delivery for sign-in. Reports success for unknown
    /// addresses so the endpoint cannot be used to enumerate accounts.
    async fn send_two_factor_code(&self, email: &str) -> Result<(), AuthError>;

    /// Starts an email change; the code is sent to the *new* address.
    /// Returns the normalized pending address.
    async fn request_email_change(
        &self,
        user_id: i32,
        new_email: &str,
    ) -> Result<String, AuthError>;

    async fn confirm_email_change(
        &self,
        user_id: i32,
        code: &str,
        new_email: &str,
    ) -> Result<UserProfile, AuthError>;

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Starts a password reset. Reports success for unknown addresses.
    async fn forgot_password(&self, email: &str) -> Result<(), AuthError>;

    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

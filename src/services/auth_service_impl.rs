//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::db::repositories::user;
use crate::db::{Store, UserProfile};
use crate::entities::users;
use crate::services::auth_service::{AuthError, AuthService, SigninOutcome};
use crate::services::mailer::{self, Mailer};

const TWO_FACTOR_CODE_TTL_MINUTES: i64 = 10;
const CHANGE_CODE_TTL_MINUTES: i64 = 30;

const MIN_PASSWORD_LENGTH: usize = 6;

pub struct SeaOrmAuthService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, mailer: Arc<dyn Mailer>, security: SecurityConfig) -> Self {
        Self {
            store,
            mailer,
            security,
        }
    }

    async fn require_user(&self, user_id: i32) -> Result<users::Model, AuthError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(user::hash_password_async(password.to_string(), Some(self.security.clone())).await?)
    }

    /// Generate, persist, and email a fresh 2FA code. The stored code is
    /// left in place when delivery fails; a retry reuses it.
    async fn send_two_factor_challenge(&self, target: &users::Model) -> Result<(), AuthError> {
        let code = generate_code();
        let expiry = expiry_in_minutes(TWO_FACTOR_CODE_TTL_MINUTES);
        self.store
            .set_two_factor_code(target.id, &code, &expiry)
            .await?;

        let (subject, html) = mailer::two_factor_email(&target.name, &code);
        self.mailer
            .send(&target.email, &subject, &html)
            .await
            .map_err(|e| AuthError::EmailDelivery(e.to_string()))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Option<&str>,
    ) -> Result<UserProfile, AuthError> {
        let email = email.trim().to_lowercase();

        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::Validation(
                "User with this email already exists".to_string(),
            ));
        }

        let hash = self.hash(password).await?;

        // Only grant admin when explicitly requested; everything else is a
        // plain user. New accounts get 2FA by default.
        let role = if role == Some("admin") { "admin" } else { "user" };
        let created = self
            .store
            .create_user(&email, &hash, name, role, true)
            .await?;

        tracing::info!(email = %created.email, "User signed up");
        Ok(created.into())
    }

    async fn signin(
        &self,
        email: &str,
        password: &str,
        code: Option<&str>,
    ) -> Result<SigninOutcome, AuthError> {
        let email = email.trim().to_lowercase();

        let Some(account) = self.store.get_user_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid =
            user::verify_password(account.password_hash.clone(), password.to_string()).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        if account.two_factor_enabled {
            let Some(code) = code else {
                self.send_two_factor_challenge(&account).await?;
                return Ok(SigninOutcome::ChallengeSent);
            };

            match check_code(
                account.two_factor_code.as_deref(),
                account.two_factor_code_expiry.as_deref(),
                code,
            ) {
                CodeCheck::Missing => return Err(AuthError::CodeMissing),
                CodeCheck::Expired => {
                    self.store.clear_two_factor_code(account.id).await?;
                    return Err(AuthError::CodeExpired);
                }
                CodeCheck::Mismatch => return Err(AuthError::CodeInvalid),
                CodeCheck::Valid => {
                    self.store.clear_two_factor_code(account.id).await?;
                }
            }
        }

        Ok(SigninOutcome::SignedIn(account.into()))
    }

    async fn current_user(&self, user_id: i32) -> Result<UserProfile, AuthError> {
        Ok(self.require_user(user_id).await?.into())
    }

    async fn begin_two_factor_enrollment(&self, user_id: i32) -> Result<(), AuthError> {
        let account = self.require_user(user_id).await?;
        self.send_two_factor_challenge(&account).await
    }

    async fn confirm_two_factor_enrollment(
        &self,
        user_id: i32,
        code: &str,
    ) -> Result<(), AuthError> {
        let account = self.require_user(user_id).await?;

        match check_code(
            account.two_factor_code.as_deref(),
            account.two_factor_code_expiry.as_deref(),
            code,
        ) {
            CodeCheck::Missing => Err(AuthError::CodeMissing),
            CodeCheck::Expired => {
                self.store.clear_two_factor_code(account.id).await?;
                Err(AuthError::CodeExpired)
            }
            CodeCheck::Mismatch => Err(AuthError::CodeInvalid),
            CodeCheck::Valid => {
                self.store.enable_two_factor(account.id).await?;
                tracing::info!(user_id, "Two-factor authentication enabled");
                Ok(())
            }
        }
    }

    async fn disable_two_factor(&self, user_id: i32) -> Result<(), AuthError> {
        self.require_user(user_id).await?;
        self.store.disable_two_factor(user_id).await?;
        tracing::info!(user_id, "Two-factor authentication disabled");
        Ok(())
    }

    async fn send_two_factor_code(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim().to_lowercase();

        // Unknown address: report success so the endpoint can't be used to
        // probe for accounts.
        let Some(account) = self.store.get_user_by_email(&email).await? else {
            return Ok(());
        };

        if !account.two_factor_enabled {
            return Err(AuthError::Validation(
                "Two-factor authentication is not enabled for this account".to_string(),
            ));
        }

        self.send_two_factor_challenge(&account).await
    }

    async fn request_email_change(
        &self,
        user_id: i32,
        new_email: &str,
    ) -> Result<String, AuthError> {
        let new_email = new_email.trim().to_lowercase();
        let account = self.require_user(user_id).await?;

        if account.email == new_email {
            return Err(AuthError::Validation(
                "New email must be different from current email".to_string(),
            ));
        }

        if self.store.get_user_by_email(&new_email).await?.is_some() {
            return Err(AuthError::Validation(
                "This email is already in use".to_string(),
            ));
        }

        let code = generate_code();
        let expiry = expiry_in_minutes(CHANGE_CODE_TTL_MINUTES);
        self.store
            .set_email_change_code(account.id, &code, &expiry)
            .await?;

        let (subject, html) = mailer::email_change_email(&account.name, &code);
        self.mailer
            .send(&new_email, &subject, &html)
            .await
            .map_err(|e| AuthError::EmailDelivery(e.to_string()))?;

        Ok(new_email)
    }

    async fn confirm_email_change(
        &self,
        user_id: i32,
        code: &str,
        new_email: &str,
    ) -> Result<UserProfile, AuthError> {
        let new_email = new_email.trim().to_lowercase();
        let account = self.require_user(user_id).await?;

        match check_code(
            account.email_change_code.as_deref(),
            account.email_change_expiry.as_deref(),
            code,
        ) {
            CodeCheck::Missing => Err(AuthError::CodeMissing),
            CodeCheck::Expired => {
                self.store.clear_email_change_code(account.id).await?;
                Err(AuthError::CodeExpired)
            }
            CodeCheck::Mismatch => Err(AuthError::CodeInvalid),
            CodeCheck::Valid => {
                if new_email == account.email {
                    return Err(AuthError::Validation(
                        "Email verification failed".to_string(),
                    ));
                }

                let updated = self.store.apply_email_change(account.id, &new_email).await?;
                tracing::info!(user_id, "Email address changed");
                Ok(updated.into())
            }
        }
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(
                "New password must be at least 6 characters long".to_string(),
            ));
        }

        let account = self.require_user(user_id).await?;

        let current_ok = user::verify_password(
            account.password_hash.clone(),
            current_password.to_string(),
        )
        .await?;
        if !current_ok {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let same = user::verify_password(account.password_hash.clone(), new_password.to_string())
            .await?;
        if same {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let hash = self.hash(new_password).await?;
        self.store.update_user_password(account.id, &hash).await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim().to_lowercase();

        let Some(account) = self.store.get_user_by_email(&email).await? else {
            return Ok(());
        };

        let code = generate_code();
        let expiry = expiry_in_minutes(CHANGE_CODE_TTL_MINUTES);
        self.store
            .set_password_reset_code(account.id, &code, &expiry)
            .await?;

        let (subject, html) = mailer::password_reset_email(&account.name, &code);
        self.mailer
            .send(&account.email, &subject, &html)
            .await
            .map_err(|e| AuthError::EmailDelivery(e.to_string()))
    }

    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(
                "Password must be at least 6 characters long".to_string(),
            ));
        }

        let email = email.trim().to_lowercase();
        let Some(account) = self.store.get_user_by_email(&email).await? else {
            return Err(AuthError::Validation(
                "Invalid email or verification code".to_string(),
            ));
        };

        // Whitespace around a pasted reset code is not a mismatch.
        match check_code(
            account.password_reset_code.as_deref(),
            account.password_reset_expiry.as_deref(),
            code.trim(),
        ) {
            CodeCheck::Missing => Err(AuthError::CodeMissing),
            CodeCheck::Expired => {
                self.store.clear_password_reset_code(account.id).await?;
                Err(AuthError::CodeExpired)
            }
            CodeCheck::Mismatch => Err(AuthError::CodeInvalid),
            CodeCheck::Valid => {
                let hash = self.hash(new_password).await?;
                self.store.reset_user_password(account.id, &hash).await?;
                tracing::info!(user_id = account.id, "Password reset completed");
                Ok(())
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CodeCheck {
    Missing,
    Expired,
    Mismatch,
    Valid,
}

/// Evaluate a supplied one-time code against the stored pending state.
/// Clearing on expiry is the caller's job; this function only classifies.
fn check_code(stored_code: Option<&str>, stored_expiry: Option<&str>, supplied: &str) -> CodeCheck {
    let (Some(stored), Some(expiry)) = (stored_code, stored_expiry) else {
        return CodeCheck::Missing;
    };

    // An unparseable expiry forces the caller onto a fresh code.
    let Ok(expiry) = chrono::DateTime::parse_from_rfc3339(expiry) else {
        return CodeCheck::Expired;
    };

    if chrono::Utc::now() > expiry {
        return CodeCheck::Expired;
    }

    if stored == supplied {
        CodeCheck::Valid
    } else {
        CodeCheck::Mismatch
    }
}

/// Fresh uniformly-random 6-digit code.
fn generate_code() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    rng.random_range(100_000..1_000_000).to_string()
}

fn expiry_in_minutes(minutes: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::minutes(minutes)).to_rfc3339()
}

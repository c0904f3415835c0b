//! Outbound email for one-time codes.
//!
//! Delivery sits behind the [`Mailer`] trait so the auth service never
//! touches SMTP directly; tests swap in a capturing implementation and
//! deployments without SMTP credentials fall back to [`LogMailer`].

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::MailerConfig;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Invalid mail address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError>;
}

/// SMTP delivery over STARTTLS with the configured relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailerConfig) -> anyhow::Result<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid from address: {e}"))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError> {
        let to: Mailbox = to.parse().map_err(|e| MailerError::Address(format!("{e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| MailerError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailerError::Delivery(e.to_string()))
    }
}

/// Logs the mail instead of sending it. Used when SMTP is not configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<(), MailerError> {
        tracing::info!(to, subject, "SMTP disabled; mail not sent");
        Ok(())
    }
}

fn code_email(title: &str, name: &str, intro: &str, code: &str, expiry_note: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: #1f2937; padding: 30px; text-align: center; border-radius: 10px 10px 0 0;">
      <h1 style="color: white; margin: 0;">Foliotrack</h1>
    </div>
    <div style="background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; border: 1px solid #e0e0e0;">
      <h2 style="margin-top: 0;">{title}</h2>
      <p>Hello {name},</p>
      <p>{intro}</p>
      <div style="background: white; border: 2px dashed #1f2937; border-radius: 8px; padding: 20px; text-align: center; margin: 20px 0;">
        <h1 style="font-size: 36px; letter-spacing: 8px; margin: 0; font-family: 'Courier New', monospace;">{code}</h1>
      </div>
      <p style="color: #666; font-size: 14px;">{expiry_note}</p>
      <p style="color: #666; font-size: 14px;">If you didn't request this code, please ignore this email.</p>
    </div>
  </body>
</html>
"#
    )
}

#[must_use]
pub fn two_factor_email(name: &str, code: &str) -> (String, String) {
    (
        "Your Two-Factor Authentication Code".to_string(),
        code_email(
            "Two-Factor Authentication",
            name,
            "You've requested a two-factor authentication code. Use the code below to complete your login:",
            code,
            "This code will expire in 10 minutes.",
        ),
    )
}

#[must_use]
pub fn email_change_email(name: &str, code: &str) -> (String, String) {
    (
        "Verify Your New Email Address".to_string(),
        code_email(
            "Email Verification",
            name,
            "You've requested to change your email address. Use the verification code below to confirm your new email:",
            code,
            "This code will expire in 30 minutes.",
        ),
    )
}

#[must_use]
pub fn password_reset_email(name: &str, code: &str) -> (String, String) {
    (
        "Password Reset Code".to_string(),
        code_email(
            "Password Reset",
            name,
            "You've requested to reset your password. Use the code below to choose a new one:",
            code,
            "This code will expire in 30 minutes.",
        ),
    )
}

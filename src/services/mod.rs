pub mod mailer;
pub use mailer::{LogMailer, Mailer, MailerError, SmtpMailer};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, SigninOutcome};
pub use auth_service_impl::SeaOrmAuthService;

pub mod portfolio_service;
pub mod portfolio_service_impl;
pub use portfolio_service::{
    CategoryUpdateInput, EntryUpdateInput, NewCategoryInput, NewEntryInput, PortfolioError,
    PortfolioService,
};
pub use portfolio_service_impl::SeaOrmPortfolioService;

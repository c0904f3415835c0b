use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, Mailer, PortfolioService, SeaOrmAuthService, SeaOrmPortfolioService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub mailer: Arc<dyn Mailer>,

    pub auth_service: Arc<dyn AuthService>,

    pub portfolio_service: Arc<dyn PortfolioService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = if config.mailer.enabled {
            Arc::new(crate::services::SmtpMailer::new(&config.mailer)?)
        } else {
            Arc::new(crate::services::LogMailer)
        };

        Self::with_mailer(config, mailer).await
    }

    /// Build the state with an explicit mailer. Tests inject a capturing
    /// implementation here to observe one-time codes.
    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            mailer.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let portfolio_service =
            Arc::new(SeaOrmPortfolioService::new(store.clone())) as Arc<dyn PortfolioService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            mailer,
            auth_service,
            portfolio_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}

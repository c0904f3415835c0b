pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod portfolio;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use db::Store;
use db::repositories::user;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "foliotrack")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Serve) => serve(config, prometheus_handle).await,

        Some(Commands::Init) => {
            if Config::create_default_if_missing()? {
                println!("Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists; nothing to do.");
            }
            Ok(())
        }

        Some(Commands::CreateAdmin {
            email,
            password,
            name,
        }) => cmd_create_admin(&config, &email, &password, &name).await,
    }
}

async fn serve(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Foliotrack v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = api::create_app_state_from_config(config.clone(), prometheus_handle).await?;

    let app = api::router(state).await;
    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("API server running at http://{addr}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    info!("Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}

async fn cmd_create_admin(
    config: &Config,
    email: &str,
    password: &str,
    name: &str,
) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    if password.len() < 6 {
        anyhow::bail!("Password must be at least 6 characters");
    }

    let store = Store::new(&config.general.database_path).await?;

    let hash =
        user::hash_password_async(password.to_string(), Some(config.security.clone())).await?;

    // An existing account is promoted instead: role becomes admin and the
    // password is replaced with the one given here.
    if let Some(existing) = store.get_user_by_email(&email).await? {
        store.promote_user_to_admin(existing.id, &hash).await?;

        println!("User already exists. Updated to admin:");
        println!("  Email: {}", existing.email);
        println!("  Name:  {}", existing.name);
        return Ok(());
    }

    // CLI-created admins start without 2FA.
    let created = store
        .create_user(&email, &hash, name, "admin", false)
        .await?;

    println!("Admin account created:");
    println!("  Email: {}", created.email);
    println!("  Name:  {}", created.name);

    Ok(())
}

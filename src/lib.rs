pub mod analysis;
pub mod api;
pub mod auth;
pub mod config;
pub mod core_state;
pub mod db;
pub mod extraction;
pub mod models;
pub mod report;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::{CoreError, CoreState};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database initialization failed: {0}")]
    Core(#[from] CoreError),
    #[error(transparent)]
    Server(#[from] api::server::ServerError),
    #[error("Cannot listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Start the service and block until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(config::default_log_filter(config::Environment::Production));
            tracing::error!("{e}");
            return Err(e.into());
        }
    };
    init_tracing(config::default_log_filter(config.environment));

    tracing::info!(
        "{} starting v{} ({:?})",
        config::APP_NAME,
        config::APP_VERSION,
        config.environment
    );
    tracing::info!(path = %config.database_path.display(), "Opening database");
    if config.uses_development_jwt_secret() {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }
    if config.gemini.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, PDF upload is disabled");
    }
    if config.google.is_none() {
        tracing::info!("Google sign-in not configured");
    }

    let bind_addr = config.bind_addr;
    let core = Arc::new(CoreState::new(config));

    core.initialize_database()?;
    // Retried lazily on the next request that needs it
    if let Err(e) = core.reload_catalog() {
        tracing::warn!("Reference catalog not loaded at startup: {e}");
    }

    let mut server = api::server::start_api_server(core, bind_addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    let signal = tokio::signal::ctrl_c().await;
    server.shutdown();
    server.stopped().await;
    signal.map_err(StartupError::Signal)
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

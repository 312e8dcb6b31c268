use std::path::PathBuf;
use std::sync::Arc;

use aeroguard::api::AppState;
use aeroguard::config::{AeroGuardConfig, LoggingConfig};
use aeroguard::{WaqiClient, web};
use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("aeroguard={},tower_http=info,warn", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AeroGuardConfig::load_from_path(config_path)
        .context("Failed to load AeroGuard configuration")?;

    init_tracing(&config.logging);
    tracing::info!("Starting AeroGuard {}", aeroguard::VERSION);

    let provider = WaqiClient::new(&config.provider).context("Failed to build provider client")?;
    let state = Arc::new(AppState::new(Arc::new(provider), &config));

    web::run(state, config.server.port).await
}

mod app;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use gamedex_core::{
    config::{self, AppConfig},
    CatalogGateway, CatalogViewState, RawgClient,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()
        .with_context(|| format!("failed to load configuration ({})", config_path.display()))?;
    info!(?config, "configuration loaded");

    let client = RawgClient::new(&config)?;
    let view = CatalogViewState::new(CatalogGateway::new(client));

    let mut app = app::GamedexApp::new(view);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("gamedex.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout belongs to the terminal UI, so everything goes to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}

//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded [`Config`] to a served router.

pub mod database;
pub mod provider;
pub mod routes;
pub mod server;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use vidhub_core::Config;
use vidhub_db::{create_category_store, create_video_store};

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = config.environment(),
        provider = %config.video_provider(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let provider = provider::setup_provider(&config)?;
    let image_host = provider::setup_image_host(&config)?;

    let state = Arc::new(AppState::new(
        config.clone(),
        Some(pool.clone()),
        create_video_store(pool.clone()),
        create_category_store(pool),
        provider,
        image_host,
    ));

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}

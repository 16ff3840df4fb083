//! survey-server - HTTP webhook transport for the survey interview engine
//!
//! Accepts inbound participant events as JSON and answers with the
//! payloads the engine rendered for them.

use anyhow::Context;
use std::sync::Arc;
use survey_core::{AdvisoryService, Database, SurveyConfig};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod routes;
mod services;
mod state;

use services::{RetentionService, RETENTION_PERIOD};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("survey_server=info".parse()?)
                .add_directive("survey_core=info".parse()?),
        )
        .init();

    info!("survey-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = SurveyConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(database = %config.database.path.display(), "Config loaded");

    let db = Database::open_path(&config.database.path)
        .with_context(|| format!("Failed to open database {}", config.database.path.display()))?;
    db.migrate().context("Failed to apply database schema")?;

    let advisor =
        AdvisoryService::from_config(&config.advisor).context("Failed to build advisor client")?;
    if !config.advisor.is_enabled() {
        warn!("Advisor is not configured; consultations will use the fallback reply");
    }

    let bind_addr = config.server.bind_addr.clone();
    let retention = config.retention.clone();
    let state = AppState::new(config, db, advisor);

    let retention_task = if retention.enabled {
        let service = Arc::new(RetentionService::new(Arc::clone(&state.db), &retention));
        Some(service.start(RETENTION_PERIOD))
    } else {
        None
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(task) = retention_task {
        task.abort();
    }
    info!("Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

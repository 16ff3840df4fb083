//! survey - Survey bot administration CLI
//!
//! Question authoring, statistics, CSV export, retention cleanup,
//! advisor connectivity checks and a console interview transport.

use anyhow::{Context, Result};
use clap::Parser;
use survey_core::SurveyConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("survey=info".parse()?)
                .add_directive("survey_core=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = SurveyConfig::load().context("Failed to load configuration")?;
    if let Some(path) = cli.database {
        config = config.with_database_path(path);
    }
    config.validate().context("Invalid configuration")?;

    // Execute command
    match cli.command {
        Commands::Init => commands::init::execute(&config),
        Commands::Question(cmd) => commands::question::execute(cmd, &config),
        Commands::Stats { json } => commands::stats::execute(json, &config),
        Commands::Export { output } => commands::export::execute(&output, &config),
        Commands::Cleanup { days, yes } => commands::cleanup::execute(days, yes, &config),
        Commands::AdvisorCheck => commands::advisor::execute(&config).await,
        Commands::Chat { participant, name } => {
            commands::chat::execute(&participant, name.as_deref(), &config).await
        }
        Commands::Version => {
            println!("survey {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

//! Command implementations for the survey CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod advisor;
pub mod chat;
pub mod cleanup;
pub mod export;
pub mod init;
pub mod question;
pub mod stats;

use anyhow::{Context, Result};
use survey_core::{Database, SurveyConfig};

/// Open the configured database, creating the schema if needed
pub(crate) fn open_database(config: &SurveyConfig) -> Result<Database> {
    let path = &config.database.path;
    let db = Database::open_path(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    db.migrate().context("Failed to apply database schema")?;
    Ok(db)
}

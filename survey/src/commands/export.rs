//! CSV export command.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use survey_core::reporting::export_csv;
use survey_core::SurveyConfig;

use super::open_database;

pub fn execute(output: &Path, config: &SurveyConfig) -> Result<()> {
    let db = open_database(config)?;
    let report = export_csv(&db, output, config.display.offset())
        .with_context(|| format!("Failed to export into {}", output.display()))?;

    println!("{} Export complete", "✓".green());
    for (label, path, rows) in [
        ("interviews", &report.interviews, Some(report.interview_rows)),
        ("responses", &report.responses, Some(report.response_rows)),
        ("consultations", &report.consultations, Some(report.consultation_rows)),
        ("summary", &report.summary, None),
    ] {
        match rows {
            Some(n) => println!("  {:<14} {} ({} rows)", label, path.display(), n),
            None => println!("  {:<14} {}", label, path.display()),
        }
    }
    Ok(())
}

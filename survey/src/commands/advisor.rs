//! Advisor connectivity check.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use survey_core::{AdvisoryService, SurveyConfig};

pub async fn execute(config: &SurveyConfig) -> Result<()> {
    println!("{}", "Advisor check".cyan().bold());
    println!("{}", "─".repeat(50));

    if !config.advisor.is_enabled() {
        println!(
            "  {}",
            "○ not configured (set advisor.base_url or SURVEY_ADVISOR_URL)".yellow()
        );
        println!("  Consultations will use the fallback reply.");
        return Ok(());
    }

    println!("  Endpoint: {}", config.advisor.base_url);
    println!("  Model:    {}", config.advisor.model);

    let service =
        AdvisoryService::from_config(&config.advisor).context("Failed to build advisor client")?;
    print!("  Status:   ");
    match service.backend().ping().await {
        Ok(reply) => {
            println!("{}", "✓ reachable".green());
            println!("  Reply:    {}", reply.trim());
            Ok(())
        }
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            bail!("Advisor is not reachable");
        }
    }
}

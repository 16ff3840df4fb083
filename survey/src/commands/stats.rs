//! Overall statistics command.

use anyhow::Result;
use colored::Colorize;
use survey_core::reporting::{overall_stats, OverallStats};
use survey_core::time::format_local;
use survey_core::SurveyConfig;

use super::open_database;

pub fn execute(json: bool, config: &SurveyConfig) -> Result<()> {
    let db = open_database(config)?;
    let stats = overall_stats(&db)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats, config);
    }
    Ok(())
}

fn print_stats(stats: &OverallStats, config: &SurveyConfig) {
    println!("{}", "Survey Statistics".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("  Interviews:       {}", stats.interviews);
    println!("  Completed:        {}", stats.completed_interviews);
    println!("  Responses:        {}", stats.responses);
    println!("  Consultations:    {}", stats.consultations);
    println!();
    println!("  {}", "Choices:".cyan());
    println!(
        "    Product A:      {}{}",
        stats.choice_a,
        percent_suffix(stats.choice_a_percent)
    );
    println!(
        "    Product B:      {}{}",
        stats.choice_b,
        percent_suffix(stats.choice_b_percent)
    );

    if let Some(latest) = &stats.latest_interview {
        println!();
        println!("  {}", "Latest interview:".cyan());
        println!(
            "    {} ({}) - {}, started {}",
            latest.display_name.as_deref().unwrap_or("(no name)"),
            latest.participant_id,
            latest.status,
            format_local(latest.started_at, config.display.offset())
        );
    }
}

fn percent_suffix(percent: Option<f64>) -> String {
    percent
        .map(|p| format!(" ({:.1}%)", p))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_suffix() {
        assert_eq!(percent_suffix(Some(66.666)), " (66.7%)");
        assert_eq!(percent_suffix(None), "");
    }
}

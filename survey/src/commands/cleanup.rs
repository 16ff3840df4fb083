//! Retention cleanup command.

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;
use survey_core::db::InterviewStatus;
use survey_core::SurveyConfig;

use super::open_database;

pub fn execute(days: Option<u32>, yes: bool, config: &SurveyConfig) -> Result<()> {
    let days = days.unwrap_or(config.retention.days);
    let statuses = &config.retention.statuses;
    let description = describe(days, statuses);

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {}?", description))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Cancelled".yellow());
            return Ok(());
        }
    }

    let db = open_database(config)?;
    let removed = db.cleanup_older_than(days, statuses)?;
    println!("{} Removed {} ({})", "✓".green(), plural(removed), description);
    Ok(())
}

fn describe(days: u32, statuses: &[InterviewStatus]) -> String {
    let names: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
    format!(
        "{} interviews finished more than {} day(s) ago",
        names.join("/"),
        days
    )
}

fn plural(n: usize) -> String {
    if n == 1 {
        "1 interview".to_string()
    } else {
        format!("{} interviews", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(30, &[InterviewStatus::Completed, InterviewStatus::Restarted]),
            "completed/restarted interviews finished more than 30 day(s) ago"
        );
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1), "1 interview");
        assert_eq!(plural(0), "0 interviews");
    }
}

//! Schema initialisation.

use anyhow::Result;
use colored::Colorize;
use survey_core::SurveyConfig;

use super::open_database;

pub fn execute(config: &SurveyConfig) -> Result<()> {
    let db = open_database(config)?;
    let questions = db.list_questions(true)?.len();

    println!(
        "{} Database ready at {}",
        "✓".green(),
        config.database.path.display()
    );
    if questions == 0 {
        println!(
            "  {}",
            "No questions yet. Add some with `survey question add-choice` or `add-text`.".yellow()
        );
    } else {
        println!("  {} active questions", questions);
    }
    Ok(())
}

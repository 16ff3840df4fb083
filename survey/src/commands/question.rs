//! Question authoring commands.

use anyhow::{bail, Result};
use colored::Colorize;
use survey_core::db::{NewChoiceQuestion, NewTextQuestion, Question, QuestionKind};
use survey_core::{Database, SurveyConfig};

use super::open_database;
use crate::cli::{QuestionAction, QuestionCommand};

pub fn execute(cmd: QuestionCommand, config: &SurveyConfig) -> Result<()> {
    let db = open_database(config)?;

    match cmd.action {
        QuestionAction::AddChoice {
            text,
            market_context,
            option_a,
            option_b,
            details_a,
            details_b,
            category,
        } => {
            let id = db.create_choice_question(&NewChoiceQuestion {
                text,
                market_context,
                option_a,
                option_b,
                option_a_details: details_a,
                option_b_details: details_b,
                category,
            })?;
            println!("{} Added choice question #{}", "✓".green(), id);
        }
        QuestionAction::AddText {
            text,
            category,
            explanation,
        } => {
            let id = db.create_text_question(&NewTextQuestion {
                text,
                category,
                explanation,
            })?;
            println!("{} Added text question #{}", "✓".green(), id);
        }
        QuestionAction::List { all, json } => {
            let questions = db.list_questions(!all)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&questions)?);
            } else {
                print_questions(&questions);
            }
        }
        QuestionAction::Deactivate { id } => deactivate(&db, id)?,
    }

    Ok(())
}

fn deactivate(db: &Database, id: i64) -> Result<()> {
    if !db.deactivate_question(id)? {
        bail!("Question #{} not found", id);
    }
    println!("{} Question #{} deactivated", "✓".green(), id);
    Ok(())
}

fn print_questions(questions: &[Question]) {
    if questions.is_empty() {
        println!("{}", "No questions".yellow());
        return;
    }

    println!("{}", "Questions".cyan().bold());
    println!("{}", "─".repeat(50));
    for q in questions {
        println!("{}", question_line(q));
        if let (Some(a), Some(b)) = (&q.option_a, &q.option_b) {
            println!("      A: {}  |  B: {}", a, b);
        }
    }
    println!();
    println!("  {} question(s)", questions.len());
}

fn question_line(q: &Question) -> String {
    let kind = match q.kind {
        QuestionKind::Choice => "choice".blue(),
        QuestionKind::Text => "text".magenta(),
    };
    let state = if q.is_active {
        String::new()
    } else {
        format!(" {}", "(inactive)".dimmed())
    };
    format!(
        "  #{:<4} [{}] {}{}",
        q.id,
        kind,
        truncate(&q.text, 60),
        state
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

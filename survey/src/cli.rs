//! CLI argument definitions using clap derive macros.
//!
//! Command structure for survey administration and console interviews.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Survey bot administration CLI
///
/// Question authoring, reporting, retention cleanup and console interviews.
#[derive(Parser, Debug)]
#[command(name = "survey")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file (overrides config and SURVEY_DATABASE_PATH)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database schema
    Init,

    /// Question authoring and listing
    Question(QuestionCommand),

    /// Show overall statistics
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Export interviews, responses and consultations as CSV
    Export {
        /// Output directory
        #[arg(short, long, default_value = "exports")]
        output: PathBuf,
    },

    /// Delete finished interviews older than a number of days
    Cleanup {
        /// Age in days (defaults to the configured retention)
        #[arg(short, long)]
        days: Option<u32>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check connectivity to the advisory backend
    AdvisorCheck,

    /// Run an interview in this terminal
    Chat {
        /// Participant identifier
        #[arg(short, long, default_value = "console")]
        participant: String,

        /// Display name used in greetings
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show version
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Question Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct QuestionCommand {
    #[command(subcommand)]
    pub action: QuestionAction,
}

#[derive(Subcommand, Debug)]
pub enum QuestionAction {
    /// Add a product-choice question
    AddChoice {
        /// Question text
        text: String,

        /// Market situation shown with the question
        #[arg(long = "context")]
        market_context: String,

        /// Product A
        #[arg(long)]
        option_a: String,

        /// Product B
        #[arg(long)]
        option_b: String,

        /// Details for product A
        #[arg(long)]
        details_a: Option<String>,

        /// Details for product B
        #[arg(long)]
        details_b: Option<String>,

        /// Category (default: financial_choice)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Add an open-text question
    AddText {
        /// Question text
        text: String,

        /// Category (default: general)
        #[arg(short, long)]
        category: Option<String>,

        /// Note for analysts
        #[arg(short, long)]
        explanation: Option<String>,
    },

    /// List questions in presentation order
    List {
        /// Include deactivated questions
        #[arg(short, long)]
        all: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Retire a question without touching recorded answers
    Deactivate {
        /// Question ID
        id: i64,
    },
}

//! Database types for survey-core.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Answer text stored for an explicitly skipped question.
pub const SKIPPED_ANSWER: &str = "[question skipped]";

/// Consultation category tag used by the interview engine.
pub const ADVISOR_CONSULTATION: &str = "advisor_advice";

// ─────────────────────────────────────────────────────────────────────────────
// Enumerations
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of survey question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Binary product choice between option A and option B.
    Choice,
    /// Open free-text answer.
    Text,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Choice => "choice",
            QuestionKind::Text => "text",
        }
    }
}

/// Lifecycle status of an interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Active,
    Completed,
    Restarted,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Active => "active",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Restarted => "restarted",
        }
    }

    /// Terminal statuses are eligible for retention cleanup.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InterviewStatus::Active)
    }
}

/// One of the two products offered by a choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceOption {
    A,
    B,
}

impl ChoiceOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChoiceOption::A => "A",
            ChoiceOption::B => "B",
        }
    }
}

macro_rules! impl_text_enum {
    ($ty:ty, $name:literal, [$($text:literal => $variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(Error::validation(format!("unknown {}: {}", $name, other))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

impl_text_enum!(QuestionKind, "question type", ["choice" => QuestionKind::Choice, "text" => QuestionKind::Text]);
impl_text_enum!(InterviewStatus, "interview status", [
    "active" => InterviewStatus::Active,
    "completed" => InterviewStatus::Completed,
    "restarted" => InterviewStatus::Restarted,
]);
impl_text_enum!(ChoiceOption, "choice option", ["a" => ChoiceOption::A, "b" => ChoiceOption::B]);

// ─────────────────────────────────────────────────────────────────────────────
// Entity Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub kind: QuestionKind,
    pub category: Option<String>,
    pub difficulty: i32,
    pub explanation: Option<String>,
    pub is_active: bool,
    pub market_context: Option<String>,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_a_details: Option<String>,
    pub option_b_details: Option<String>,
    pub created_at: i64,
}

impl Question {
    /// Product text for the given option, if this is a choice question.
    pub fn option_text(&self, option: ChoiceOption) -> Option<&str> {
        match option {
            ChoiceOption::A => self.option_a.as_deref(),
            ChoiceOption::B => self.option_b.as_deref(),
        }
    }

    /// Context handed to the advisory backend for this question.
    pub fn context(&self) -> QuestionContext {
        let owned = |v: &Option<String>| v.clone().unwrap_or_default();
        QuestionContext {
            question_text: self.text.clone(),
            market_context: owned(&self.market_context),
            option_a: owned(&self.option_a),
            option_a_details: owned(&self.option_a_details),
            option_b: owned(&self.option_b),
            option_b_details: owned(&self.option_b_details),
        }
    }
}

/// Market/product context of a question, as seen by the advisory backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionContext {
    pub question_text: String,
    pub market_context: String,
    pub option_a: String,
    pub option_a_details: String,
    pub option_b: String,
    pub option_b_details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: i64,
    pub participant_id: String,
    pub display_name: Option<String>,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub status: InterviewStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub interview_id: i64,
    pub question_id: i64,
    pub answer_text: Option<String>,
    pub selected_option: Option<ChoiceOption>,
    pub consultations_count: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: i64,
    pub interview_id: i64,
    pub question_id: i64,
    pub user_query: String,
    pub advisor_reply: String,
    pub consultation_type: Option<String>,
    pub created_at: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Types (for creating entities)
// ─────────────────────────────────────────────────────────────────────────────

/// Input for creating a binary product-choice question
#[derive(Debug, Clone, Default)]
pub struct NewChoiceQuestion {
    pub text: String,
    pub market_context: String,
    pub option_a: String,
    pub option_b: String,
    pub option_a_details: Option<String>,
    pub option_b_details: Option<String>,
    /// Defaults to "financial_choice"
    pub category: Option<String>,
}

/// Input for creating an open-text question
#[derive(Debug, Clone, Default)]
pub struct NewTextQuestion {
    pub text: String,
    /// Defaults to "general"
    pub category: Option<String>,
    pub explanation: Option<String>,
}

/// Input for recording a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
    pub answer_text: Option<String>,
    pub selected_option: Option<ChoiceOption>,
}

impl NewResponse {
    /// A product choice; the answer text names the chosen option.
    pub fn choice(option: ChoiceOption) -> Self {
        Self {
            answer_text: Some(format!("Product {} chosen", option)),
            selected_option: Some(option),
        }
    }

    /// A free-text answer.
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer_text: Some(answer.into()),
            selected_option: None,
        }
    }

    /// An explicit skip.
    pub fn skipped() -> Self {
        Self {
            answer_text: Some(SKIPPED_ANSWER.to_string()),
            selected_option: None,
        }
    }
}

/// Input for recording a consultation
#[derive(Debug, Clone)]
pub struct NewConsultation {
    pub user_query: String,
    pub advisor_reply: String,
    pub consultation_type: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Types
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a response insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new response row was inserted with this id.
    Recorded(i64),
    /// A response already exists for the (interview, question) pair; nothing was written.
    Duplicate,
}

/// A response joined with the question it answers.
///
/// Question fields are `None` when the question row no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseWithQuestion {
    pub response: Response,
    pub question_text: Option<String>,
    pub question_kind: Option<QuestionKind>,
}

/// Answered vs. total active questions for an interview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub answered: i64,
    pub total: i64,
}

/// Result of starting an interview.
#[derive(Debug, Clone)]
pub struct StartedInterview {
    pub interview: Interview,
    /// Ids of previously active interviews moved to `restarted`.
    pub restarted: Vec<i64>,
}

/// Derived statistics for one interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSummary {
    pub interview_id: i64,
    pub participant_id: String,
    pub display_name: Option<String>,
    pub status: InterviewStatus,
    pub answered: i64,
    pub total_questions: i64,
    pub choice_a: i64,
    pub choice_b: i64,
    pub consultations: i64,
    pub started_at: i64,
    pub completed_at: Option<i64>,
}

impl InterviewSummary {
    /// Duration in milliseconds, when the interview has been closed.
    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at.map(|end| end - self.started_at)
    }

    /// Share of active questions answered (0 when there are none).
    pub fn completion_rate(&self) -> f64 {
        if self.total_questions > 0 {
            self.answered as f64 / self.total_questions as f64
        } else {
            0.0
        }
    }
}

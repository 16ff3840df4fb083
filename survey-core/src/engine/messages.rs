//! Participant-facing texts and button layouts.

use chrono::FixedOffset;

use super::events::Action;
use super::StatusSnapshot;
use crate::db::{ChoiceOption, InterviewSummary, Progress, Question};
use crate::time::{format_duration, format_local, offset_label};
use crate::tracker::Expectation;
use crate::transport::{LabeledAction, RenderPayload};

fn choice_row(question_id: i64) -> Vec<LabeledAction> {
    vec![
        LabeledAction::new(
            "Choose A",
            Action::Choose {
                option: ChoiceOption::A,
                question_id,
            },
        ),
        LabeledAction::new(
            "Choose B",
            Action::Choose {
                option: ChoiceOption::B,
                question_id,
            },
        ),
    ]
}

pub fn welcome(display_name: Option<&str>) -> RenderPayload {
    let greeting = match display_name {
        Some(name) if !name.trim().is_empty() => format!("Hello, {}!", name.trim()),
        _ => "Hello!".to_string(),
    };
    RenderPayload::text(format!(
        "Welcome to the financial interview!\n\n\
         {} I will ask you about choosing financial products under different market conditions.\n\n\
         How it works:\n\
         • Questions come in a fixed order\n\
         • Choice questions: pick product A or B\n\
         • Text questions: write your answer\n\
         • You can consult the advisor about any choice question\n\
         • Your answers are saved for research\n\n\
         Commands:\n\
         /start - start or restart the interview\n\
         /end - finish the interview\n\
         /status - show progress\n\
         /help - help",
        greeting
    ))
    .with_row(vec![LabeledAction::new("Begin interview", Action::PresentQuestion)])
}

pub fn help() -> RenderPayload {
    RenderPayload::text(
        "Survey bot help\n\n\
         Commands:\n\
         /start - start a new interview\n\
         /end - finish the current interview\n\
         /status - show interview progress\n\
         /help - show this help\n\n\
         How the interview works:\n\
         • Questions are shown in order\n\
         • Choice questions: pick product A or B\n\
         • Text questions: reply with your answer, or skip\n\
         • Press \"Ask the advisor\" and type a question to get a consultation\n\
         • Answers are saved automatically\n\n\
         Rules:\n\
         • Each question can be answered only once\n\
         • You can start a new interview at any time\n\
         • Finishing asks for confirmation and shows your statistics",
    )
    .splittable()
}

fn progress_line(progress: Progress) -> String {
    format!("Progress: {}/{} questions", progress.answered, progress.total)
}

pub fn choice_question(question: &Question, progress: Progress) -> RenderPayload {
    let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();
    RenderPayload::text(format!(
        "{}\n\n\
         Question {}:\n{}\n\n\
         Market situation:\n{}\n\n\
         Product A: {}\n{}\n\n\
         Product B: {}\n{}",
        progress_line(progress),
        progress.answered + 1,
        question.text,
        or_empty(&question.market_context),
        or_empty(&question.option_a),
        or_empty(&question.option_a_details),
        or_empty(&question.option_b),
        or_empty(&question.option_b_details),
    ))
    .with_row(choice_row(question.id))
    .with_row(vec![LabeledAction::new(
        "Ask the advisor",
        Action::RequestConsult {
            question_id: question.id,
        },
    )])
    .splittable()
}

pub fn text_question(question: &Question, progress: Progress) -> RenderPayload {
    RenderPayload::text(format!(
        "{}\n\nQuestion {}:\n{}\n\nWrite your answer in the next message.",
        progress_line(progress),
        progress.answered + 1,
        question.text,
    ))
    .with_row(vec![LabeledAction::new(
        "Skip question",
        Action::Skip {
            question_id: question.id,
        },
    )])
    .splittable()
}

pub fn all_answered(progress: Progress) -> RenderPayload {
    RenderPayload::text(format!(
        "Congratulations!\n\n\
         You have gone through all {} questions.\n\n\
         Your result: {}/{}\n\n\
         You can now finish the interview and see your statistics.",
        progress.total, progress.answered, progress.total
    ))
    .with_row(vec![LabeledAction::new("Finish interview", Action::EndInterview)])
}

pub fn choice_saved(product: &str) -> RenderPayload {
    RenderPayload::text(format!("Your choice is saved.\n\nYou chose: {}", product))
}

pub fn text_saved(answer: &str) -> RenderPayload {
    RenderPayload::text(format!("Your answer is saved.\n\nAnswer: {}", answer)).splittable()
}

pub fn skipped() -> RenderPayload {
    RenderPayload::text("Question skipped.")
}

pub fn duplicate_answer() -> RenderPayload {
    RenderPayload::text("You have already answered this question.")
}

pub fn empty_answer() -> RenderPayload {
    RenderPayload::text("The message is empty. Please write some text.")
}

pub fn consult_prompt(question_id: i64) -> RenderPayload {
    RenderPayload::text(
        "Consultation with the advisor\n\n\
         Ask your question about the financial products and the advisor will help you sort it out.\n\n\
         Examples:\n\
         • \"Which product is safer?\"\n\
         • \"What is better with high inflation?\"\n\
         • \"Explain the difference between the products\"\n\
         • \"Work out the real return\"\n\n\
         Write your question in the next message.",
    )
    .with_row(vec![LabeledAction::new(
        "Cancel consultation",
        Action::CancelConsult { question_id },
    )])
}

pub fn consult_working() -> RenderPayload {
    RenderPayload::text("Asking the advisor, this may take a few seconds...")
}

pub fn consult_reply(reply: &str, saved: bool) -> RenderPayload {
    let text = if saved {
        reply.to_string()
    } else {
        format!("{}\n\nThe consultation could not be saved.", reply)
    };
    RenderPayload::text(text).splittable()
}

pub fn consult_followup(question_id: i64) -> RenderPayload {
    RenderPayload::text("Now choose one of the products or ask another question:")
        .with_row(choice_row(question_id))
        .with_row(vec![LabeledAction::new(
            "Ask another question",
            Action::RequestConsult { question_id },
        )])
}

pub fn consult_cancelled() -> RenderPayload {
    RenderPayload::text("Consultation cancelled. Choose one of the products or ask again.")
}

pub fn confirm_end() -> RenderPayload {
    RenderPayload::text("Finish the interview\n\nAre you sure you want to finish the current interview?")
        .with_row(vec![
            LabeledAction::new("Yes, finish", Action::ConfirmEnd),
            LabeledAction::new("Continue later", Action::DeclineEnd),
        ])
}

pub fn end_declined() -> RenderPayload {
    RenderPayload::text("All right!\n\nYou can continue the interview later or start a new one with /start")
}

pub fn nothing_to_end() -> RenderPayload {
    RenderPayload::text("You have no active interview to finish.\n\nUse /start to begin a new one.")
}

pub fn no_active_interview() -> RenderPayload {
    RenderPayload::text("No active interview found. Use /start")
}

pub fn not_understood() -> RenderPayload {
    RenderPayload::text("I do not understand this message. Use /help for help or /start to begin the interview.")
}

pub fn rejected(reason: &str) -> RenderPayload {
    RenderPayload::text(format!("This action cannot be completed: {}", reason))
}

pub fn failure() -> RenderPayload {
    RenderPayload::text("Something went wrong while processing your message. Please try again.")
}

pub fn summary(summary: &InterviewSummary, offset: FixedOffset) -> RenderPayload {
    let completed_at = summary.completed_at.unwrap_or(summary.started_at);
    RenderPayload::text(format!(
        "The interview is complete!\n\n\
         Your statistics:\n\n\
         Answers:\n\
         • Answered questions: {} of {}\n\
         • Product A chosen: {}\n\
         • Product B chosen: {}\n\n\
         Advisor consultations:\n\
         • Total consultations: {}\n\n\
         Time ({}):\n\
         • Duration: {}\n\
         • Started: {}\n\
         • Finished: {}\n\n\
         Thank you for taking part in the study!\n\n\
         To start a new interview use /start",
        summary.answered,
        summary.total_questions,
        summary.choice_a,
        summary.choice_b,
        summary.consultations,
        offset_label(offset),
        format_duration(summary.started_at, completed_at),
        format_local(summary.started_at, offset),
        format_local(completed_at, offset),
    ))
    .splittable()
}

pub fn status(snapshot: &StatusSnapshot, offset: FixedOffset) -> RenderPayload {
    let pending = match snapshot.pending {
        Some(Expectation::AwaitingTextAnswer(_)) => "\nWaiting for your answer to a text question",
        Some(Expectation::AwaitingConsultationQuery(_)) => "\nWaiting for your question to the advisor",
        None => "",
    };
    RenderPayload::text(format!(
        "Interview status:\n\n\
         The interview is active\n\
         Progress: {}/{} questions\n\
         Advisor consultations: {}\n\
         Duration: {}\n\
         Interview ID: {}\n\
         Started: {} ({}){}\n\n\
         To finish use /end",
        snapshot.progress.answered,
        snapshot.progress.total,
        snapshot.consultations,
        format_duration(0, snapshot.elapsed_ms),
        snapshot.interview_id,
        format_local(snapshot.started_at, offset),
        offset_label(offset),
        pending,
    ))
}

pub fn no_status() -> RenderPayload {
    RenderPayload::text("Interview status:\n\nNo active interview\n\nTo start a new interview use /start")
}

//! survey-core - Core library for the survey bot
//!
//! This crate provides shared functionality between the survey CLI and survey-server:
//!
//! - **db**: Direct SQLite database access (questions, interviews, responses, consultations)
//! - **tracker**: Per-participant conversational state
//! - **engine**: Interview orchestration state machine
//! - **advisor**: Advisory backend with fail-open fallback
//! - **transport**: Outbound rendering contract and message splitting
//! - **reporting**: Overall statistics and CSV export
//! - **config**: Configuration loading and validation

pub mod advisor;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod reporting;
pub mod time;
pub mod tracker;
pub mod transport;

// Re-export commonly used types
pub use advisor::AdvisoryService;
pub use config::SurveyConfig;
pub use db::Database;
pub use engine::{Action, EventOutcome, InboundEvent, InterviewEngine, StatusSnapshot};
pub use error::{Error, Result};
pub use tracker::{ConversationTracker, Expectation, InMemoryTracker};
pub use transport::{BufferedTransport, LabeledAction, RenderPayload, Transport};

//! Inbound events and button actions.
//!
//! Actions have a compact text encoding (`choose:A:12`, `skip:7`, ...)
//! so chat transports with short opaque button payloads can round-trip
//! them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::ChoiceOption;
use crate::error::Error;

/// A control the participant can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Show the next unanswered question
    PresentQuestion,
    Choose { option: ChoiceOption, question_id: i64 },
    Skip { question_id: i64 },
    RequestConsult { question_id: i64 },
    CancelConsult { question_id: i64 },
    /// Ask to end the interview (leads to a confirmation)
    EndInterview,
    ConfirmEnd,
    DeclineEnd,
}

impl Action {
    /// Compact callback payload for this action
    pub fn encode(&self) -> String {
        match self {
            Action::PresentQuestion => "next".to_string(),
            Action::Choose {
                option,
                question_id,
            } => format!("choose:{}:{}", option, question_id),
            Action::Skip { question_id } => format!("skip:{}", question_id),
            Action::RequestConsult { question_id } => format!("consult:{}", question_id),
            Action::CancelConsult { question_id } => format!("cancel_consult:{}", question_id),
            Action::EndInterview => "end".to_string(),
            Action::ConfirmEnd => "confirm_end".to_string(),
            Action::DeclineEnd => "decline_end".to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::validation(format!("unknown action payload: {}", s));
        let question_id = |raw: &str| raw.parse::<i64>().map_err(|_| invalid());

        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            ["next"] => Ok(Action::PresentQuestion),
            ["end"] => Ok(Action::EndInterview),
            ["confirm_end"] => Ok(Action::ConfirmEnd),
            ["decline_end"] => Ok(Action::DeclineEnd),
            ["choose", option, id] => Ok(Action::Choose {
                option: option.parse().map_err(|_| invalid())?,
                question_id: question_id(id)?,
            }),
            ["skip", id] => Ok(Action::Skip {
                question_id: question_id(id)?,
            }),
            ["consult", id] => Ok(Action::RequestConsult {
                question_id: question_id(id)?,
            }),
            ["cancel_consult", id] => Ok(Action::CancelConsult {
                question_id: question_id(id)?,
            }),
            _ => Err(invalid()),
        }
    }
}

/// Everything a transport can deliver to the engine for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Start {
        #[serde(default)]
        display_name: Option<String>,
    },
    End,
    Status,
    Help,
    Button {
        action: Action,
    },
    FreeText {
        text: String,
    },
}

impl InboundEvent {
    /// Interpret a chat line: slash commands map to commands, anything
    /// else is free text.
    pub fn from_chat_line(line: &str, display_name: Option<&str>) -> Self {
        let trimmed = line.trim();
        let command = trimmed
            .strip_prefix('/')
            .and_then(|rest| rest.split_whitespace().next())
            .map(str::to_ascii_lowercase);

        match command.as_deref() {
            Some("start") => InboundEvent::Start {
                display_name: display_name.map(String::from),
            },
            Some("end") => InboundEvent::End,
            Some("status") => InboundEvent::Status,
            Some("help") => InboundEvent::Help,
            _ => InboundEvent::FreeText {
                text: line.to_string(),
            },
        }
    }

    /// Short name for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Start { .. } => "start",
            InboundEvent::End => "end",
            InboundEvent::Status => "status",
            InboundEvent::Help => "help",
            InboundEvent::Button { .. } => "button",
            InboundEvent::FreeText { .. } => "free_text",
        }
    }
}

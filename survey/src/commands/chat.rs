//! Console interview transport.
//!
//! Runs the interview engine against stdin/stdout. Buttons are printed
//! with a `/N` shortcut; typing `/N` presses button N from the most
//! recent set of buttons. Everything else is read as a chat line
//! (`/start`, `/end`, `/status`, `/help` or free text). `/quit` exits.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use survey_core::transport::split_payload;
use survey_core::{
    Action, AdvisoryService, InMemoryTracker, InboundEvent, InterviewEngine, RenderPayload,
    SurveyConfig, Transport,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::open_database;

const QUIT_COMMAND: &str = "/quit";

#[derive(Default)]
struct Offered {
    actions: Vec<Action>,
    /// No buttons rendered yet for the current input line
    fresh_turn: bool,
}

/// Transport printing payloads to a terminal.
pub struct ConsoleTransport {
    out: Mutex<Box<dyn Write + Send>>,
    max_message_length: usize,
    offered: Mutex<Offered>,
}

impl ConsoleTransport {
    pub fn new(out: Box<dyn Write + Send>, max_message_length: usize) -> Self {
        Self {
            out: Mutex::new(out),
            max_message_length,
            offered: Mutex::new(Offered::default()),
        }
    }

    pub fn stdout(max_message_length: usize) -> Self {
        Self::new(Box::new(std::io::stdout()), max_message_length)
    }

    /// Start of a new input line: the next buttons replace the current ones
    pub fn begin_turn(&self) {
        self.offered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fresh_turn = true;
    }

    /// Buttons currently reachable through `/N`
    pub fn offered_actions(&self) -> Vec<Action> {
        self.offered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .actions
            .clone()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn render(&self, _participant_id: &str, payload: RenderPayload) -> survey_core::Result<()> {
        let mut rendered = String::new();
        {
            let mut offered = self.offered.lock().unwrap_or_else(PoisonError::into_inner);
            for part in split_payload(payload, self.max_message_length) {
                if !part.actions.is_empty() && offered.fresh_turn {
                    offered.actions.clear();
                    offered.fresh_turn = false;
                }
                let first_index = offered.actions.len() + 1;
                offered.actions.extend(part.all_actions().map(|a| a.action));
                rendered.push_str(&format_payload(&part, first_index));
            }
        }

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(rendered.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| survey_core::Error::Transport(e.to_string()))
    }
}

/// Payload text followed by numbered button rows and a blank line
fn format_payload(payload: &RenderPayload, first_index: usize) -> String {
    let mut text = format!("{}\n", payload.text);
    let mut index = first_index;
    for row in &payload.actions {
        let buttons: Vec<String> = row
            .iter()
            .map(|button| {
                let shortcut = format!("[/{}]", index).cyan().to_string();
                index += 1;
                format!("{} {}", shortcut, button.label)
            })
            .collect();
        text.push_str(&format!("  {}\n", buttons.join("   ")));
    }
    text.push('\n');
    text
}

/// Map one console line to an inbound event; `None` for blank lines
fn resolve_input(line: &str, offered: &[Action], display_name: Option<&str>) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let button = line
        .strip_prefix('/')
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| offered.get(i));
    if let Some(action) = button {
        return Some(InboundEvent::Button { action: *action });
    }

    Some(InboundEvent::from_chat_line(line, display_name))
}

pub async fn execute(participant_id: &str, display_name: Option<&str>, config: &SurveyConfig) -> Result<()> {
    let db = Arc::new(open_database(config)?);
    let advisor =
        AdvisoryService::from_config(&config.advisor).context("Failed to build advisor client")?;
    let transport = Arc::new(ConsoleTransport::stdout(config.display.max_message_length));
    let engine = InterviewEngine::new(
        db,
        Arc::new(InMemoryTracker::new()),
        advisor,
        transport.clone(),
        config.display.offset(),
    );

    println!(
        "{}",
        format!("Console interview as participant {}. Type {} to leave.", participant_id, QUIT_COMMAND)
            .dimmed()
    );
    println!();

    transport.begin_turn();
    engine
        .handle(
            participant_id,
            InboundEvent::Start {
                display_name: display_name.map(str::to_string),
            },
        )
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().eq_ignore_ascii_case(QUIT_COMMAND) {
            break;
        }

        let Some(event) = resolve_input(&line, &transport.offered_actions(), display_name) else {
            continue;
        };
        transport.begin_turn();
        let outcome = engine.handle(participant_id, event).await?;
        debug!(?outcome, "console event handled");
    }

    println!();
    println!("{}", "Bye!".dimmed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_core::db::{ChoiceOption, NewChoiceQuestion};
    use survey_core::{Database, LabeledAction};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn choose(option: ChoiceOption) -> Action {
        Action::Choose {
            option,
            question_id: 1,
        }
    }

    #[test]
    fn test_resolve_input() {
        let offered = [choose(ChoiceOption::A), choose(ChoiceOption::B)];

        assert_eq!(resolve_input("   ", &offered, None), None);
        assert_eq!(
            resolve_input("/2", &offered, None),
            Some(InboundEvent::Button {
                action: choose(ChoiceOption::B)
            })
        );
        assert_eq!(
            resolve_input("/help", &offered, None),
            Some(InboundEvent::Help)
        );
        // Out of range falls through to the chat-line parser
        assert!(!matches!(
            resolve_input("/3", &offered, None),
            Some(InboundEvent::Button { .. })
        ));
        // Bare numbers are answers, not buttons
        assert_eq!(
            resolve_input("2", &offered, None),
            Some(InboundEvent::FreeText { text: "2".into() })
        );
    }

    #[test]
    fn test_format_payload_numbers_buttons() {
        let payload = RenderPayload::text("Pick one").with_row(vec![
            LabeledAction::new("Choose A", choose(ChoiceOption::A)),
            LabeledAction::new("Choose B", choose(ChoiceOption::B)),
        ]);
        let text = format_payload(&payload, 3);
        assert!(text.starts_with("Pick one\n"));
        assert!(text.contains("/3]"));
        assert!(text.contains("Choose A"));
        assert!(text.contains("/4]"));
    }

    #[tokio::test]
    async fn test_console_interview_turns() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db.create_choice_question(&NewChoiceQuestion {
            text: "Deposit or fund?".into(),
            market_context: "Inflation is 9%".into(),
            option_a: "Deposit".into(),
            option_b: "Fund".into(),
            ..Default::default()
        })
        .unwrap();

        let buffer = SharedBuffer::default();
        let transport = Arc::new(ConsoleTransport::new(Box::new(buffer.clone()), 4000));
        let engine = InterviewEngine::new(
            Arc::new(db),
            Arc::new(InMemoryTracker::new()),
            AdvisoryService::disabled(),
            transport.clone(),
            survey_core::time::offset_from_minutes(180).unwrap(),
        );

        transport.begin_turn();
        engine
            .handle("c1", InboundEvent::Start { display_name: Some("Ann".into()) })
            .await
            .unwrap();

        // Welcome "Begin" is /1, then the question's buttons follow
        let offered = transport.offered_actions();
        assert_eq!(offered[0], Action::PresentQuestion);
        assert_eq!(offered[1], choose(ChoiceOption::A));
        assert_eq!(offered[2], choose(ChoiceOption::B));

        // Status renders no buttons, so the question's buttons stay reachable
        transport.begin_turn();
        engine.handle("c1", InboundEvent::Status).await.unwrap();
        assert_eq!(transport.offered_actions().len(), offered.len());

        let event = resolve_input("/3", &transport.offered_actions(), None).unwrap();
        transport.begin_turn();
        engine.handle("c1", event).await.unwrap();

        let out = buffer.contents();
        assert!(out.contains("Hello, Ann!"));
        assert!(out.contains("Deposit or fund?"));
        assert!(out.contains("You chose: Fund"));
        assert!(out.contains("Congratulations!"));
        // The completion prompt replaced the earlier buttons
        assert_eq!(transport.offered_actions(), vec![Action::EndInterview]);
    }
}

//! Outbound rendering contract and transport helpers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::engine::Action;
use crate::error::Result;

/// Prefix marking every part after the first of a split message.
pub const CONTINUATION_PREFIX: &str = "(continued)\n\n";

/// A button: display label plus the action it triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledAction {
    pub label: String,
    pub action: Action,
    /// Compact callback payload (see [`Action::encode`])
    pub payload: String,
}

impl LabeledAction {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            payload: action.encode(),
            action,
        }
    }
}

/// Something the engine wants shown to a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPayload {
    pub text: String,
    /// Rows of buttons, rendered top to bottom
    pub actions: Vec<Vec<LabeledAction>>,
    /// Set when the text may exceed a transport message limit
    pub split_hint: bool,
}

impl RenderPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Append a row of buttons
    pub fn with_row(mut self, row: Vec<LabeledAction>) -> Self {
        if !row.is_empty() {
            self.actions.push(row);
        }
        self
    }

    pub fn splittable(mut self) -> Self {
        self.split_hint = true;
        self
    }

    /// All buttons in display order
    pub fn all_actions(&self) -> impl Iterator<Item = &LabeledAction> {
        self.actions.iter().flatten()
    }

    /// Whether a button for `action` is offered
    pub fn offers(&self, action: &Action) -> bool {
        self.all_actions().any(|a| &a.action == action)
    }
}

/// Delivers rendered payloads to participants.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn render(&self, participant_id: &str, payload: RenderPayload) -> Result<()>;
}

/// Split text into parts of at most `max` characters.
///
/// Paragraphs (separated by blank lines) are packed greedily; a single
/// paragraph longer than `max` is hard-cut.
pub fn split_long_text(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    if text.chars().count() <= max {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in text.split("\n\n") {
        let paragraph_len = paragraph.chars().count();
        if current_len + paragraph_len <= max {
            current.push_str(paragraph);
            current.push_str("\n\n");
            current_len += paragraph_len + 2;
            continue;
        }

        if !current.trim().is_empty() {
            parts.push(current.trim().to_string());
        }
        current.clear();

        let mut rest: Vec<char> = paragraph.chars().collect();
        while rest.len() > max {
            parts.push(rest.drain(..max).collect());
        }
        current.extend(rest.iter());
        current.push_str("\n\n");
        current_len = rest.len() + 2;
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Split a payload for delivery.
///
/// Only payloads carrying the split hint are split. Continuation parts
/// get [`CONTINUATION_PREFIX`]; buttons attach to the last part only.
pub fn split_payload(payload: RenderPayload, max: usize) -> Vec<RenderPayload> {
    if !payload.split_hint || payload.text.chars().count() <= max {
        return vec![payload];
    }

    let parts = split_long_text(&payload.text, max);
    let last = parts.len().saturating_sub(1);
    let mut actions = Some(payload.actions);

    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| RenderPayload {
            text: if i == 0 {
                part
            } else {
                format!("{}{}", CONTINUATION_PREFIX, part)
            },
            actions: if i == last {
                actions.take().unwrap_or_default()
            } else {
                Vec::new()
            },
            split_hint: false,
        })
        .collect()
}

/// Transport that collects payloads per participant until taken.
///
/// Request/response transports (HTTP webhook, tests) render into this and
/// return the collected payloads once the event has been handled.
#[derive(Debug, Default)]
pub struct BufferedTransport {
    outbox: Mutex<HashMap<String, Vec<RenderPayload>>>,
}

impl BufferedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything rendered for a participant
    pub async fn take(&self, participant_id: &str) -> Vec<RenderPayload> {
        self.outbox
            .lock()
            .await
            .remove(participant_id)
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for BufferedTransport {
    async fn render(&self, participant_id: &str, payload: RenderPayload) -> Result<()> {
        self.outbox
            .lock()
            .await
            .entry(participant_id.to_string())
            .or_default()
            .push(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_untouched() {
        assert_eq!(split_long_text("hello\n\nworld", 100), vec!["hello\n\nworld"]);
    }

    #[test]
    fn test_split_packs_paragraphs() {
        let text = format!("{}\n\n{}\n\n{}", "a".repeat(6), "b".repeat(6), "c".repeat(3));
        assert_eq!(split_long_text(&text, 10), vec!["aaaaaa", "bbbbbb", "ccc"]);
        assert_eq!(split_long_text(&text, 11), vec!["aaaaaa", "bbbbbb\n\nccc"]);
    }

    #[test]
    fn test_split_hard_cuts_long_paragraph() {
        let text = format!("intro\n\n{}", "x".repeat(25));
        let parts = split_long_text(&text, 10);
        assert_eq!(parts, vec!["intro", "xxxxxxxxxx", "xxxxxxxxxx", "xxxxx"]);
        assert!(parts.iter().all(|p| p.chars().count() <= 10));
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        let text = "ж".repeat(12);
        let parts = split_long_text(&text, 5);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], "жж");
    }

    #[test]
    fn test_split_payload_keeps_buttons_on_last_part() {
        let payload = RenderPayload::text(format!("{}\n\n{}", "a".repeat(8), "b".repeat(8)))
            .with_row(vec![LabeledAction::new("Next", Action::PresentQuestion)])
            .splittable();
        let parts = split_payload(payload, 10);

        assert_eq!(parts.len(), 2);
        assert!(parts[0].actions.is_empty());
        assert_eq!(parts[1].text, format!("{}{}", CONTINUATION_PREFIX, "b".repeat(8)));
        assert!(parts[1].offers(&Action::PresentQuestion));
        assert_eq!(parts[1].actions[0][0].payload, "next");
    }

    #[test]
    fn test_unhinted_payload_is_not_split() {
        let payload = RenderPayload::text("a".repeat(50));
        assert_eq!(split_payload(payload.clone(), 10), vec![payload]);
    }

    #[tokio::test]
    async fn test_buffered_transport_take() {
        let transport = BufferedTransport::new();
        transport.render("u1", RenderPayload::text("one")).await.unwrap();
        transport.render("u1", RenderPayload::text("two")).await.unwrap();
        transport.render("u2", RenderPayload::text("other")).await.unwrap();

        let texts: Vec<String> = transport.take("u1").await.into_iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert!(transport.take("u1").await.is_empty());
        assert_eq!(transport.take("u2").await.len(), 1);
    }
}

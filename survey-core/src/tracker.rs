//! Conversational state tracker.
//!
//! Remembers, per participant, how the next free-text message should be
//! interpreted. Entries are hints only: losing them (process restart)
//! never affects recorded responses or consultations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// What the engine expects the participant's next free text to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "question_id", rename_all = "snake_case")]
pub enum Expectation {
    /// An answer to an open-text question
    AwaitingTextAnswer(i64),
    /// A query for the advisory backend about a question
    AwaitingConsultationQuery(i64),
}

impl Expectation {
    pub fn question_id(&self) -> i64 {
        match self {
            Expectation::AwaitingTextAnswer(id) | Expectation::AwaitingConsultationQuery(id) => {
                *id
            }
        }
    }
}

/// Key-value store of pending expectations, keyed by participant id.
///
/// Injected into the engine so a persistent or shared implementation can
/// replace the in-memory one.
#[async_trait]
pub trait ConversationTracker: Send + Sync {
    async fn get(&self, participant_id: &str) -> Option<Expectation>;

    async fn set(&self, participant_id: &str, expectation: Expectation);

    /// Remove the entry, returning what was pending.
    async fn clear(&self, participant_id: &str) -> Option<Expectation>;
}

/// Process-lifetime tracker held in memory.
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    entries: RwLock<HashMap<String, Expectation>>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of participants with a pending expectation
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationTracker for InMemoryTracker {
    async fn get(&self, participant_id: &str) -> Option<Expectation> {
        self.entries.read().await.get(participant_id).copied()
    }

    async fn set(&self, participant_id: &str, expectation: Expectation) {
        self.entries
            .write()
            .await
            .insert(participant_id.to_string(), expectation);
    }

    async fn clear(&self, participant_id: &str) -> Option<Expectation> {
        self.entries.write().await.remove(participant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_replaces_previous_entry() {
        let tracker = InMemoryTracker::new();
        assert_eq!(tracker.get("u1").await, None);

        tracker.set("u1", Expectation::AwaitingTextAnswer(2)).await;
        tracker.set("u1", Expectation::AwaitingConsultationQuery(3)).await;
        tracker.set("u2", Expectation::AwaitingTextAnswer(1)).await;

        assert_eq!(
            tracker.get("u1").await,
            Some(Expectation::AwaitingConsultationQuery(3))
        );
        assert_eq!(tracker.len().await, 2);

        assert_eq!(
            tracker.clear("u1").await.map(|e| e.question_id()),
            Some(3)
        );
        assert_eq!(tracker.clear("u1").await, None);
        assert_eq!(tracker.get("u2").await, Some(Expectation::AwaitingTextAnswer(1)));
    }
}

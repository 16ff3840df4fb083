//! Application state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use survey_core::{
    AdvisoryService, BufferedTransport, Database, InMemoryTracker, InterviewEngine, SurveyConfig,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<SurveyConfig>,
    /// Database connection
    pub db: Arc<Database>,
    /// Interview engine driving every participant conversation
    pub engine: Arc<InterviewEngine>,
    /// Outbox the engine renders into; drained per request
    pub outbox: Arc<BufferedTransport>,
    /// Server start time
    pub start_time: Instant,
    /// Per-participant request gates so one request drains only its own payloads
    request_gates: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: SurveyConfig, db: Database, advisor: AdvisoryService) -> Arc<Self> {
        let db = Arc::new(db);
        let outbox = Arc::new(BufferedTransport::new());
        let engine = InterviewEngine::new(
            Arc::clone(&db),
            Arc::new(InMemoryTracker::new()),
            advisor,
            outbox.clone(),
            config.display.offset(),
        );

        Arc::new(Self {
            config: Arc::new(config),
            db,
            engine: Arc::new(engine),
            outbox,
            start_time: Instant::now(),
            request_gates: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Gate held from event dispatch until the outbox is drained
    pub fn request_gate(&self, participant_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self
            .request_gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        gates.entry(participant_id.to_string()).or_default().clone()
    }

    /// Return a gate; the entry is dropped once no other request holds it
    pub fn release_gate(&self, participant_id: &str, gate: Arc<tokio::sync::Mutex<()>>) {
        let mut gates = self
            .request_gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        drop(gate);
        if gates
            .get(participant_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            gates.remove(participant_id);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use survey_core::db::{NewChoiceQuestion, NewTextQuestion};

    /// State over an in-memory store seeded with one choice and one text question
    pub fn seeded_state() -> Arc<AppState> {
        seeded_state_with(SurveyConfig::default())
    }

    pub fn seeded_state_with(config: SurveyConfig) -> Arc<AppState> {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db.create_choice_question(&NewChoiceQuestion {
            text: "Where do you keep your savings?".into(),
            market_context: "The key rate is 16%".into(),
            option_a: "Bank deposit".into(),
            option_b: "Bond fund".into(),
            ..Default::default()
        })
        .unwrap();
        db.create_text_question(&NewTextQuestion {
            text: "Why?".into(),
            ..Default::default()
        })
        .unwrap();

        AppState::new(config, db, AdvisoryService::disabled())
    }

    #[test]
    fn test_state_shares_database() {
        let state = seeded_state();
        assert!(Arc::ptr_eq(&state.db, state.engine.database()));
        assert_eq!(state.db.list_questions(true).unwrap().len(), 2);
    }

    #[test]
    fn test_request_gate_is_per_participant() {
        let state = seeded_state();
        let a1 = state.request_gate("a");
        let a2 = state.request_gate("a");
        let b = state.request_gate("b");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[test]
    fn test_released_gates_are_dropped() {
        let state = seeded_state();
        let first = state.request_gate("a");
        let second = state.request_gate("a");

        state.release_gate("a", first);
        assert!(state.request_gates.lock().unwrap().contains_key("a"));

        state.release_gate("a", second);
        assert!(state.request_gates.lock().unwrap().is_empty());
    }
}

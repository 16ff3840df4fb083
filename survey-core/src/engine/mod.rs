//! Interview orchestration engine.
//!
//! Classifies each inbound event against the participant's active
//! interview and tracker entry, applies at most one store transition,
//! and renders the result through the transport.
//!
//! Events from one participant are handled strictly one at a time
//! (including across the advisory call); different participants proceed
//! concurrently.

mod events;
pub mod messages;

pub use events::{Action, InboundEvent};

use chrono::FixedOffset;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::advisor::AdvisoryService;
use crate::db::{
    ChoiceOption, Database, Interview, InterviewSummary, NewConsultation, NewResponse,
    Progress, QuestionKind, RecordOutcome, ADVISOR_CONSULTATION,
};
use crate::error::{Error, Result};
use crate::time::now_millis;
use crate::tracker::{ConversationTracker, Expectation};
use crate::transport::{RenderPayload, Transport};

/// What handling an event did, for callers and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Started { interview_id: i64, restarted: Vec<i64> },
    QuestionPresented { question_id: i64 },
    AllQuestionsAnswered,
    Answered { question_id: i64 },
    DuplicateAnswer { question_id: i64 },
    ConsultationRequested { question_id: i64 },
    Consulted { question_id: i64, consultation_id: Option<i64> },
    ConsultationCancelled,
    EndRequested,
    EndDeclined,
    Completed(InterviewSummary),
    NothingToEnd,
    StatusShown,
    HelpShown,
    NoActiveInterview,
    EmptyText,
    NotUnderstood,
    Rejected(String),
    Failed,
}

/// Progress snapshot for the status command and the status API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub interview_id: i64,
    pub display_name: Option<String>,
    pub progress: Progress,
    pub consultations: i64,
    pub started_at: i64,
    pub elapsed_ms: i64,
    pub pending: Option<Expectation>,
}

pub struct InterviewEngine {
    db: Arc<Database>,
    tracker: Arc<dyn ConversationTracker>,
    advisor: AdvisoryService,
    transport: Arc<dyn Transport>,
    display_offset: FixedOffset,
    participant_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl InterviewEngine {
    pub fn new(
        db: Arc<Database>,
        tracker: Arc<dyn ConversationTracker>,
        advisor: AdvisoryService,
        transport: Arc<dyn Transport>,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            db,
            tracker,
            advisor,
            transport,
            display_offset,
            participant_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    fn participant_lock(&self, participant_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .participant_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(participant_id.to_string()).or_default().clone()
    }

    /// Drop the participant's lock entry once no other event holds or awaits it
    fn release_participant_lock(&self, participant_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .participant_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks
            .get(participant_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(participant_id);
        }
    }

    /// Handle one inbound event.
    ///
    /// Store and validation failures are rendered to the participant and
    /// reported as [`EventOutcome::Rejected`] / [`EventOutcome::Failed`];
    /// only transport failures are returned as errors.
    pub async fn handle(&self, participant_id: &str, event: InboundEvent) -> Result<EventOutcome> {
        let span = info_span!(
            "event",
            event_id = %Uuid::new_v4(),
            participant_id,
            kind = event.kind()
        );

        async {
            let lock = self.participant_lock(participant_id);
            let dispatched = {
                let _guard = lock.lock().await;
                self.dispatch_and_report(participant_id, event).await
            };
            self.release_participant_lock(participant_id, lock);
            dispatched
        }
        .instrument(span)
        .await
    }

    async fn dispatch_and_report(&self, participant_id: &str, event: InboundEvent) -> Result<EventOutcome> {
        match self.dispatch(participant_id, event).await {
            Ok(outcome) => {
                debug!(?outcome, "event handled");
                Ok(outcome)
            }
            Err(e @ Error::Transport(_)) => Err(e),
            Err(e) if e.is_validation() || e.is_not_found() => {
                warn!(error = %e, "event rejected");
                self.render(participant_id, messages::rejected(rejection_reason(&e)))
                    .await?;
                Ok(EventOutcome::Rejected(e.to_string()))
            }
            Err(e) => {
                error!(error = %e, "event failed");
                self.render(participant_id, messages::failure()).await?;
                Ok(EventOutcome::Failed)
            }
        }
    }

    async fn dispatch(&self, participant_id: &str, event: InboundEvent) -> Result<EventOutcome> {
        match event {
            InboundEvent::Start { display_name } => {
                self.start(participant_id, display_name.as_deref()).await
            }
            InboundEvent::End => {
                self.tracker.clear(participant_id).await;
                self.request_end(participant_id).await
            }
            InboundEvent::Status => self.show_status(participant_id).await,
            InboundEvent::Help => {
                self.render(participant_id, messages::help()).await?;
                Ok(EventOutcome::HelpShown)
            }
            InboundEvent::Button { action } => self.on_action(participant_id, action).await,
            InboundEvent::FreeText { text } => self.on_free_text(participant_id, &text).await,
        }
    }

    async fn on_action(&self, participant_id: &str, action: Action) -> Result<EventOutcome> {
        match action {
            Action::PresentQuestion => match self.active_interview(participant_id).await? {
                Some(interview) => self.present_next(participant_id, &interview).await,
                None => Ok(EventOutcome::NoActiveInterview),
            },
            Action::Choose {
                option,
                question_id,
            } => self.choose(participant_id, option, question_id).await,
            Action::Skip { question_id } => self.skip(participant_id, question_id).await,
            Action::RequestConsult { question_id } => {
                self.request_consultation(participant_id, question_id).await
            }
            Action::CancelConsult { .. } => {
                if let Some(Expectation::AwaitingConsultationQuery(_)) =
                    self.tracker.get(participant_id).await
                {
                    self.tracker.clear(participant_id).await;
                    if let Some(interview) = self.db.find_active_interview(participant_id)? {
                        self.rearm_text_answer(participant_id, &interview).await?;
                    }
                }
                self.render(participant_id, messages::consult_cancelled())
                    .await?;
                Ok(EventOutcome::ConsultationCancelled)
            }
            Action::EndInterview => self.request_end(participant_id).await,
            Action::ConfirmEnd => self.complete(participant_id).await,
            Action::DeclineEnd => {
                self.render(participant_id, messages::end_declined()).await?;
                Ok(EventOutcome::EndDeclined)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    async fn start(&self, participant_id: &str, display_name: Option<&str>) -> Result<EventOutcome> {
        self.tracker.clear(participant_id).await;
        let started = self.db.start_interview(participant_id, display_name)?;
        info!(
            interview_id = started.interview.id,
            restarted = started.restarted.len(),
            "interview started"
        );

        self.render(participant_id, messages::welcome(display_name))
            .await?;
        self.present_next(participant_id, &started.interview).await?;

        Ok(EventOutcome::Started {
            interview_id: started.interview.id,
            restarted: started.restarted,
        })
    }

    async fn present_next(&self, participant_id: &str, interview: &Interview) -> Result<EventOutcome> {
        let progress = self.db.progress(interview.id)?;
        let Some(question) = self.db.next_unanswered_question(interview.id)? else {
            self.render(participant_id, messages::all_answered(progress))
                .await?;
            return Ok(EventOutcome::AllQuestionsAnswered);
        };

        let payload = match question.kind {
            QuestionKind::Choice => messages::choice_question(&question, progress),
            QuestionKind::Text => {
                self.tracker
                    .set(participant_id, Expectation::AwaitingTextAnswer(question.id))
                    .await;
                messages::text_question(&question, progress)
            }
        };
        self.render(participant_id, payload).await?;

        debug!(interview_id = interview.id, question_id = question.id, "question presented");
        Ok(EventOutcome::QuestionPresented {
            question_id: question.id,
        })
    }

    async fn choose(
        &self,
        participant_id: &str,
        option: ChoiceOption,
        question_id: i64,
    ) -> Result<EventOutcome> {
        let Some(interview) = self.active_interview(participant_id).await? else {
            return Ok(EventOutcome::NoActiveInterview);
        };
        let question = self
            .db
            .get_question(question_id)?
            .ok_or_else(|| Error::not_found("Question", question_id))?;
        if question.kind != QuestionKind::Choice {
            return Err(Error::validation(format!(
                "question {} is not a choice question",
                question_id
            )));
        }

        match self
            .db
            .record_response(interview.id, question_id, &NewResponse::choice(option))?
        {
            RecordOutcome::Duplicate => self.duplicate(participant_id, question_id).await,
            RecordOutcome::Recorded(_) => {
                self.tracker.clear(participant_id).await;
                let product = question.option_text(option).unwrap_or(option.as_str());
                self.render(participant_id, messages::choice_saved(product))
                    .await?;
                self.present_next(participant_id, &interview).await?;
                Ok(EventOutcome::Answered { question_id })
            }
        }
    }

    async fn skip(&self, participant_id: &str, question_id: i64) -> Result<EventOutcome> {
        let Some(interview) = self.active_interview(participant_id).await? else {
            return Ok(EventOutcome::NoActiveInterview);
        };
        let question = self
            .db
            .get_question(question_id)?
            .ok_or_else(|| Error::not_found("Question", question_id))?;
        if question.kind != QuestionKind::Text {
            return Err(Error::validation(format!(
                "question {} is not a text question",
                question_id
            )));
        }

        match self
            .db
            .record_response(interview.id, question_id, &NewResponse::skipped())?
        {
            RecordOutcome::Duplicate => self.duplicate(participant_id, question_id).await,
            RecordOutcome::Recorded(_) => {
                self.tracker.clear(participant_id).await;
                self.render(participant_id, messages::skipped()).await?;
                self.present_next(participant_id, &interview).await?;
                Ok(EventOutcome::Answered { question_id })
            }
        }
    }

    async fn request_consultation(&self, participant_id: &str, question_id: i64) -> Result<EventOutcome> {
        if self.active_interview(participant_id).await?.is_none() {
            return Ok(EventOutcome::NoActiveInterview);
        }
        if self.db.get_question(question_id)?.is_none() {
            return Err(Error::not_found("Question", question_id));
        }

        self.tracker
            .set(participant_id, Expectation::AwaitingConsultationQuery(question_id))
            .await;
        self.render(participant_id, messages::consult_prompt(question_id))
            .await?;
        Ok(EventOutcome::ConsultationRequested { question_id })
    }

    async fn on_free_text(&self, participant_id: &str, text: &str) -> Result<EventOutcome> {
        let Some(expectation) = self.tracker.get(participant_id).await else {
            self.render(participant_id, messages::not_understood())
                .await?;
            return Ok(EventOutcome::NotUnderstood);
        };
        if text.trim().is_empty() {
            self.render(participant_id, messages::empty_answer()).await?;
            return Ok(EventOutcome::EmptyText);
        }

        self.tracker.clear(participant_id).await;
        let Some(interview) = self.active_interview(participant_id).await? else {
            return Ok(EventOutcome::NoActiveInterview);
        };

        match expectation {
            Expectation::AwaitingTextAnswer(question_id) => {
                self.answer_text(participant_id, &interview, question_id, text)
                    .await
            }
            Expectation::AwaitingConsultationQuery(question_id) => {
                // A text question still on screen keeps waiting for its answer
                self.rearm_text_answer(participant_id, &interview).await?;
                self.consult(participant_id, &interview, question_id, text)
                    .await
            }
        }
    }

    async fn answer_text(
        &self,
        participant_id: &str,
        interview: &Interview,
        question_id: i64,
        text: &str,
    ) -> Result<EventOutcome> {
        match self
            .db
            .record_response(interview.id, question_id, &NewResponse::text(text))?
        {
            RecordOutcome::Duplicate => self.duplicate(participant_id, question_id).await,
            RecordOutcome::Recorded(_) => {
                self.render(participant_id, messages::text_saved(text.trim()))
                    .await?;
                self.present_next(participant_id, interview).await?;
                Ok(EventOutcome::Answered { question_id })
            }
        }
    }

    async fn consult(
        &self,
        participant_id: &str,
        interview: &Interview,
        question_id: i64,
        query: &str,
    ) -> Result<EventOutcome> {
        let question = self
            .db
            .get_question(question_id)?
            .ok_or_else(|| Error::not_found("Question", question_id))?;

        self.render(participant_id, messages::consult_working())
            .await?;
        let reply = self.advisor.consult(query, &question.context()).await;

        let saved = self.db.record_consultation(
            interview.id,
            question_id,
            &NewConsultation {
                user_query: query.to_string(),
                advisor_reply: reply.clone(),
                consultation_type: ADVISOR_CONSULTATION.to_string(),
            },
        );
        let consultation_id = match saved {
            Ok(id) => Some(id),
            Err(e) => {
                error!(interview_id = interview.id, question_id, error = %e, "failed to save consultation");
                None
            }
        };

        self.render(
            participant_id,
            messages::consult_reply(&reply, consultation_id.is_some()),
        )
        .await?;
        if question.kind == QuestionKind::Choice {
            self.render(participant_id, messages::consult_followup(question_id))
                .await?;
        }

        Ok(EventOutcome::Consulted {
            question_id,
            consultation_id,
        })
    }

    async fn request_end(&self, participant_id: &str) -> Result<EventOutcome> {
        if self.db.find_active_interview(participant_id)?.is_none() {
            self.render(participant_id, messages::nothing_to_end())
                .await?;
            return Ok(EventOutcome::NothingToEnd);
        }
        self.render(participant_id, messages::confirm_end()).await?;
        Ok(EventOutcome::EndRequested)
    }

    async fn complete(&self, participant_id: &str) -> Result<EventOutcome> {
        self.tracker.clear(participant_id).await;
        let Some(interview) = self.active_interview(participant_id).await? else {
            return Ok(EventOutcome::NoActiveInterview);
        };

        let summary = self.db.complete_interview(interview.id)?;
        self.render(
            participant_id,
            messages::summary(&summary, self.display_offset),
        )
        .await?;
        Ok(EventOutcome::Completed(summary))
    }

    async fn rearm_text_answer(&self, participant_id: &str, interview: &Interview) -> Result<()> {
        if let Some(question) = self
            .db
            .next_unanswered_question(interview.id)?
            .filter(|question| question.kind == QuestionKind::Text)
        {
            self.tracker
                .set(participant_id, Expectation::AwaitingTextAnswer(question.id))
                .await;
        }
        Ok(())
    }

    async fn duplicate(&self, participant_id: &str, question_id: i64) -> Result<EventOutcome> {
        warn!(question_id, "duplicate answer attempt");
        self.render(participant_id, messages::duplicate_answer())
            .await?;
        Ok(EventOutcome::DuplicateAnswer { question_id })
    }

    async fn show_status(&self, participant_id: &str) -> Result<EventOutcome> {
        let payload = match self.status_snapshot(participant_id).await? {
            Some(snapshot) => messages::status(&snapshot, self.display_offset),
            None => messages::no_status(),
        };
        self.render(participant_id, payload).await?;
        Ok(EventOutcome::StatusShown)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Read-only progress snapshot of the participant's active interview
    pub async fn status_snapshot(&self, participant_id: &str) -> Result<Option<StatusSnapshot>> {
        let Some(interview) = self.db.find_active_interview(participant_id)? else {
            return Ok(None);
        };
        Ok(Some(StatusSnapshot {
            interview_id: interview.id,
            display_name: interview.display_name.clone(),
            progress: self.db.progress(interview.id)?,
            consultations: self.db.consultation_count(interview.id)?,
            started_at: interview.started_at,
            elapsed_ms: (now_millis() - interview.started_at).max(0),
            pending: self.tracker.get(participant_id).await,
        }))
    }

    /// Active interview, or a "restart" notice with the stale tracker entry cleared
    async fn active_interview(&self, participant_id: &str) -> Result<Option<Interview>> {
        match self.db.find_active_interview(participant_id)? {
            Some(interview) => Ok(Some(interview)),
            None => {
                self.tracker.clear(participant_id).await;
                self.render(participant_id, messages::no_active_interview())
                    .await?;
                Ok(None)
            }
        }
    }

    async fn render(&self, participant_id: &str, payload: RenderPayload) -> Result<()> {
        self.transport
            .render(participant_id, payload)
            .await
            .map_err(|e| match e {
                Error::Transport(_) => e,
                other => Error::Transport(other.to_string()),
            })
    }
}

/// Participant-facing reason for a rejected action
fn rejection_reason(error: &Error) -> &'static str {
    match error {
        Error::NotFound { .. } => "this question is no longer available.",
        Error::Validation(_) => "this button does not apply to the current question.",
        _ => "the request is not valid.",
    }
}

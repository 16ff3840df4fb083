//! Direct SQLite database access for the survey bot.
//!
//! Every write operation locks the connection, opens one transaction,
//! and either commits all of its effects or none of them.
//!
//! Database location priority (see [`crate::config`]):
//! 1. SURVEY_DATABASE_PATH env var
//! 2. `database.path` in config.toml
//! 3. ~/.survey-bot/survey.db

pub mod types;

pub use types::*;

use crate::error::{Error, Result};
use crate::time::now_millis;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Embedded schema, applied by [`Database::migrate`].
const SCHEMA_SQL: &str = include_str!("schema.sql");

const QUESTION_COLUMNS: &str = "id, text, question_type, category, difficulty, explanation, is_active,
     market_context, option_a, option_b, option_a_details, option_b_details, created_at";

const INTERVIEW_COLUMNS: &str = "id, participant_id, display_name, started_at, completed_at, status";

const RESPONSE_COLUMNS: &str =
    "id, interview_id, question_id, answer_text, selected_option, consultations_count, created_at";

const CONSULTATION_COLUMNS: &str =
    "id, interview_id, question_id, user_query, advisor_reply, consultation_type, created_at";

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Database connection wrapper.
///
/// Thread-safe via internal Mutex. All database operations acquire the lock.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open database at specific path, creating parent directories as needed
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened survey database");
        Self::configure(conn)
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Create tables and indexes if they do not exist yet
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA_SQL)?;
        info!("database schema is up to date");
        Ok(())
    }

    /// Check database connectivity
    pub fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("SELECT 1").map_err(Error::Database)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Question Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a binary product-choice question
    pub fn create_choice_question(&self, question: &NewChoiceQuestion) -> Result<i64> {
        let required = [
            ("text", &question.text),
            ("market_context", &question.market_context),
            ("option_a", &question.option_a),
            ("option_b", &question.option_b),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::validation(format!("{} must not be empty", field)));
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO questions
             (text, question_type, category, market_context, option_a, option_b,
              option_a_details, option_b_details, created_at)
             VALUES (?1, 'choice', ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                question.text.trim(),
                question.category.as_deref().unwrap_or("financial_choice"),
                question.market_context.trim(),
                question.option_a.trim(),
                question.option_b.trim(),
                trimmed(&question.option_a_details),
                trimmed(&question.option_b_details),
                now_millis(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(question_id = id, "choice question added");
        Ok(id)
    }

    /// Create an open-text question
    pub fn create_text_question(&self, question: &NewTextQuestion) -> Result<i64> {
        if question.text.trim().is_empty() {
            return Err(Error::validation("text must not be empty"));
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO questions (text, question_type, category, explanation, created_at)
             VALUES (?1, 'text', ?2, ?3, ?4)",
            params![
                question.text.trim(),
                question.category.as_deref().unwrap_or("general"),
                trimmed(&question.explanation),
                now_millis(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(question_id = id, "text question added");
        Ok(id)
    }

    /// Get question by ID
    pub fn get_question(&self, question_id: i64) -> Result<Option<Question>> {
        let conn = self.lock()?;
        Self::select_question(&conn, question_id)
    }

    fn select_question(conn: &Connection, question_id: i64) -> Result<Option<Question>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM questions WHERE id = ?1",
            QUESTION_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![question_id], Self::map_question)
            .optional()?)
    }

    /// List questions in presentation order
    pub fn list_questions(&self, active_only: bool) -> Result<Vec<Question>> {
        let conn = self.lock()?;
        let sql = if active_only {
            format!(
                "SELECT {} FROM questions WHERE is_active = 1 ORDER BY id",
                QUESTION_COLUMNS
            )
        } else {
            format!("SELECT {} FROM questions ORDER BY id", QUESTION_COLUMNS)
        };
        let mut stmt = conn.prepare(&sql)?;
        let questions = stmt
            .query_map([], Self::map_question)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(questions)
    }

    /// Retire a question without touching its history.
    ///
    /// Returns false when no question has this id.
    pub fn deactivate_question(&self, question_id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE questions SET is_active = 0 WHERE id = ?1",
            params![question_id],
        )?;
        if changed > 0 {
            info!(question_id, "question deactivated");
        }
        Ok(changed > 0)
    }

    /// Pick any active question, optionally within a category (ad-hoc tooling only)
    pub fn random_active_question(&self, category: Option<&str>) -> Result<Option<Question>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM questions
             WHERE is_active = 1 AND (?1 IS NULL OR category = ?1)
             ORDER BY RANDOM() LIMIT 1",
            QUESTION_COLUMNS
        ))?;
        Ok(stmt.query_row(params![category], Self::map_question).optional()?)
    }

    /// Lowest-id active question without a response in this interview
    pub fn next_unanswered_question(&self, interview_id: i64) -> Result<Option<Question>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM questions
             WHERE is_active = 1
               AND id NOT IN (SELECT question_id FROM responses WHERE interview_id = ?1)
             ORDER BY id
             LIMIT 1",
            QUESTION_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![interview_id], Self::map_question)
            .optional()?)
    }

    fn map_question(row: &rusqlite::Row) -> rusqlite::Result<Question> {
        Ok(Question {
            id: row.get(0)?,
            text: row.get(1)?,
            kind: row.get(2)?,
            category: row.get(3)?,
            difficulty: row.get(4)?,
            explanation: row.get(5)?,
            is_active: row.get(6)?,
            market_context: row.get(7)?,
            option_a: row.get(8)?,
            option_b: row.get(9)?,
            option_a_details: row.get(10)?,
            option_b_details: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Interview Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a fresh interview for a participant.
    ///
    /// Any interview still `active` for the participant is moved to
    /// `restarted` (with its completion time stamped) in the same
    /// transaction that inserts the new row.
    pub fn start_interview(
        &self,
        participant_id: &str,
        display_name: Option<&str>,
    ) -> Result<StartedInterview> {
        if participant_id.trim().is_empty() {
            return Err(Error::validation("participant id must not be empty"));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = now_millis();

        let restarted = {
            let mut stmt = tx.prepare(
                "SELECT id FROM interviews WHERE participant_id = ?1 AND status = 'active'",
            )?;
            stmt.query_map(params![participant_id], |row| row.get::<_, i64>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        tx.execute(
            "UPDATE interviews SET status = 'restarted', completed_at = ?1
             WHERE participant_id = ?2 AND status = 'active'",
            params![now, participant_id],
        )?;

        tx.execute(
            "INSERT INTO interviews (participant_id, display_name, started_at, status)
             VALUES (?1, ?2, ?3, 'active')",
            params![participant_id, display_name, now],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(participant_id, interview_id = id, restarted = ?restarted, "interview started");

        Ok(StartedInterview {
            interview: Interview {
                id,
                participant_id: participant_id.to_string(),
                display_name: display_name.map(String::from),
                started_at: now,
                completed_at: None,
                status: InterviewStatus::Active,
            },
            restarted,
        })
    }

    /// The single active interview for a participant, if any
    pub fn find_active_interview(&self, participant_id: &str) -> Result<Option<Interview>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM interviews WHERE participant_id = ?1 AND status = 'active'",
            INTERVIEW_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![participant_id], Self::map_interview)
            .optional()?)
    }

    /// Get interview by ID
    pub fn get_interview(&self, interview_id: i64) -> Result<Option<Interview>> {
        let conn = self.lock()?;
        Self::select_interview(&conn, interview_id)
    }

    fn select_interview(conn: &Connection, interview_id: i64) -> Result<Option<Interview>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM interviews WHERE id = ?1",
            INTERVIEW_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![interview_id], Self::map_interview)
            .optional()?)
    }

    /// List all interviews, oldest first
    pub fn list_interviews(&self) -> Result<Vec<Interview>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM interviews ORDER BY id",
            INTERVIEW_COLUMNS
        ))?;
        let interviews = stmt
            .query_map([], Self::map_interview)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(interviews)
    }

    /// Most recently started interview across all participants
    pub fn latest_interview(&self) -> Result<Option<Interview>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM interviews ORDER BY started_at DESC, id DESC LIMIT 1",
            INTERVIEW_COLUMNS
        ))?;
        Ok(stmt.query_row([], Self::map_interview).optional()?)
    }

    /// Close an active interview and return its summary
    pub fn complete_interview(&self, interview_id: i64) -> Result<InterviewSummary> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let interview = Self::select_interview(&tx, interview_id)?
            .ok_or_else(|| Error::not_found("Interview", interview_id))?;
        if interview.status != InterviewStatus::Active {
            return Err(Error::validation(format!(
                "interview {} is already {}",
                interview_id, interview.status
            )));
        }

        let now = now_millis();
        tx.execute(
            "UPDATE interviews SET status = 'completed', completed_at = ?1 WHERE id = ?2",
            params![now, interview_id],
        )?;

        let interview = Interview {
            completed_at: Some(now),
            status: InterviewStatus::Completed,
            ..interview
        };
        let summary = Self::summarize(&tx, &interview)?;
        tx.commit()?;

        info!(
            interview_id,
            answered = summary.answered,
            consultations = summary.consultations,
            "interview completed"
        );
        Ok(summary)
    }

    /// Derived statistics for an interview in any status
    pub fn interview_statistics(&self, interview_id: i64) -> Result<Option<InterviewSummary>> {
        let conn = self.lock()?;
        match Self::select_interview(&conn, interview_id)? {
            Some(interview) => Ok(Some(Self::summarize(&conn, &interview)?)),
            None => Ok(None),
        }
    }

    /// Answered vs. total active questions
    pub fn progress(&self, interview_id: i64) -> Result<Progress> {
        let conn = self.lock()?;
        let answered: i64 = conn.query_row(
            "SELECT COUNT(*) FROM responses WHERE interview_id = ?1",
            params![interview_id],
            |row| row.get(0),
        )?;
        let total = Self::count_active_questions(&conn)?;
        Ok(Progress { answered, total })
    }

    fn count_active_questions(conn: &Connection) -> Result<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM questions WHERE is_active = 1",
            [],
            |row| row.get(0),
        )?)
    }

    fn summarize(conn: &Connection, interview: &Interview) -> Result<InterviewSummary> {
        let (answered, choice_a, choice_b): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN selected_option = 'A' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN selected_option = 'B' THEN 1 ELSE 0 END), 0)
             FROM responses WHERE interview_id = ?1",
            params![interview.id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let consultations: i64 = conn.query_row(
            "SELECT COUNT(*) FROM consultations WHERE interview_id = ?1",
            params![interview.id],
            |row| row.get(0),
        )?;

        Ok(InterviewSummary {
            interview_id: interview.id,
            participant_id: interview.participant_id.clone(),
            display_name: interview.display_name.clone(),
            status: interview.status,
            answered,
            total_questions: Self::count_active_questions(conn)?,
            choice_a,
            choice_b,
            consultations,
            started_at: interview.started_at,
            completed_at: interview.completed_at,
        })
    }

    fn map_interview(row: &rusqlite::Row) -> rusqlite::Result<Interview> {
        Ok(Interview {
            id: row.get(0)?,
            participant_id: row.get(1)?,
            display_name: row.get(2)?,
            started_at: row.get(3)?,
            completed_at: row.get(4)?,
            status: row.get(5)?,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Response Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Record an answer (or skip) for a question within an active interview.
    ///
    /// A second answer for the same pair is not an error: nothing is
    /// written and [`RecordOutcome::Duplicate`] is returned.
    pub fn record_response(
        &self,
        interview_id: i64,
        question_id: i64,
        response: &NewResponse,
    ) -> Result<RecordOutcome> {
        let answer_text = response.answer_text.as_deref().map(str::trim);
        if response.selected_option.is_none() && answer_text.is_none_or(str::is_empty) {
            return Err(Error::validation("answer text must not be empty"));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existing: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM responses WHERE interview_id = ?1 AND question_id = ?2)",
            params![interview_id, question_id],
            |row| row.get(0),
        )?;
        if existing {
            debug!(interview_id, question_id, "duplicate response ignored");
            return Ok(RecordOutcome::Duplicate);
        }

        Self::ensure_active_interview(&tx, interview_id)?;
        Self::ensure_question(&tx, question_id)?;

        let consultations = Self::count_pair_consultations(&tx, interview_id, question_id)?;
        tx.execute(
            "INSERT INTO responses
             (interview_id, question_id, answer_text, selected_option, consultations_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                interview_id,
                question_id,
                answer_text,
                response.selected_option,
                consultations,
                now_millis(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(interview_id, question_id, response_id = id, "response recorded");
        Ok(RecordOutcome::Recorded(id))
    }

    /// Response for an (interview, question) pair, if one exists
    pub fn response_for(&self, interview_id: i64, question_id: i64) -> Result<Option<Response>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM responses WHERE interview_id = ?1 AND question_id = ?2",
            RESPONSE_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![interview_id, question_id], Self::map_response)
            .optional()?)
    }

    /// All responses of an interview, in answer order
    pub fn list_responses(&self, interview_id: i64) -> Result<Vec<Response>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM responses WHERE interview_id = ?1 ORDER BY id",
            RESPONSE_COLUMNS
        ))?;
        let responses = stmt
            .query_map(params![interview_id], Self::map_response)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(responses)
    }

    /// Every response joined with its question (export)
    pub fn list_responses_with_questions(&self) -> Result<Vec<ResponseWithQuestion>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.interview_id, r.question_id, r.answer_text, r.selected_option,
                    r.consultations_count, r.created_at, q.text, q.question_type
             FROM responses r
             LEFT JOIN questions q ON q.id = r.question_id
             ORDER BY r.id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ResponseWithQuestion {
                    response: Self::map_response(row)?,
                    question_text: row.get(7)?,
                    question_kind: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_response(row: &rusqlite::Row) -> rusqlite::Result<Response> {
        Ok(Response {
            id: row.get(0)?,
            interview_id: row.get(1)?,
            question_id: row.get(2)?,
            answer_text: row.get(3)?,
            selected_option: row.get(4)?,
            consultations_count: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Consultation Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Record an advisory exchange.
    ///
    /// When a response already exists for the pair, its consultation
    /// snapshot is refreshed to the new total in the same transaction.
    pub fn record_consultation(
        &self,
        interview_id: i64,
        question_id: i64,
        consultation: &NewConsultation,
    ) -> Result<i64> {
        let query = consultation.user_query.trim();
        let reply = consultation.advisor_reply.trim();
        if query.is_empty() || reply.is_empty() {
            return Err(Error::validation(
                "consultation query and reply must not be empty",
            ));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if Self::select_interview(&tx, interview_id)?.is_none() {
            return Err(Error::not_found("Interview", interview_id));
        }
        Self::ensure_question(&tx, question_id)?;

        tx.execute(
            "INSERT INTO consultations
             (interview_id, question_id, user_query, advisor_reply, consultation_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                interview_id,
                question_id,
                query,
                reply,
                consultation.consultation_type,
                now_millis(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE responses
             SET consultations_count = (
                 SELECT COUNT(*) FROM consultations WHERE interview_id = ?1 AND question_id = ?2
             )
             WHERE interview_id = ?1 AND question_id = ?2",
            params![interview_id, question_id],
        )?;
        tx.commit()?;

        info!(interview_id, question_id, consultation_id = id, "consultation recorded");
        Ok(id)
    }

    /// Number of consultations across an interview
    pub fn consultation_count(&self, interview_id: i64) -> Result<i64> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM consultations WHERE interview_id = ?1",
            params![interview_id],
            |row| row.get(0),
        )?)
    }

    /// Number of consultations for one (interview, question) pair
    pub fn consultation_count_for(&self, interview_id: i64, question_id: i64) -> Result<i64> {
        let conn = self.lock()?;
        Self::count_pair_consultations(&conn, interview_id, question_id)
    }

    fn count_pair_consultations(conn: &Connection, interview_id: i64, question_id: i64) -> Result<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM consultations WHERE interview_id = ?1 AND question_id = ?2",
            params![interview_id, question_id],
            |row| row.get(0),
        )?)
    }

    /// Consultations, optionally restricted to one interview
    pub fn list_consultations(&self, interview_id: Option<i64>) -> Result<Vec<Consultation>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM consultations WHERE (?1 IS NULL OR interview_id = ?1) ORDER BY id",
            CONSULTATION_COLUMNS
        ))?;
        let consultations = stmt
            .query_map(params![interview_id], |row| {
                Ok(Consultation {
                    id: row.get(0)?,
                    interview_id: row.get(1)?,
                    question_id: row.get(2)?,
                    user_query: row.get(3)?,
                    advisor_reply: row.get(4)?,
                    consultation_type: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(consultations)
    }

    fn ensure_active_interview(conn: &Connection, interview_id: i64) -> Result<()> {
        let status: Option<InterviewStatus> = conn
            .query_row(
                "SELECT status FROM interviews WHERE id = ?1",
                params![interview_id],
                |row| row.get(0),
            )
            .optional()?;
        match status {
            None => Err(Error::not_found("Interview", interview_id)),
            Some(InterviewStatus::Active) => Ok(()),
            Some(other) => Err(Error::validation(format!(
                "interview {} is {}",
                interview_id, other
            ))),
        }
    }

    fn ensure_question(conn: &Connection, question_id: i64) -> Result<()> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM questions WHERE id = ?1)",
            params![question_id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(Error::not_found("Question", question_id))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reporting Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Count interviews, optionally by status
    pub fn count_interviews(&self, status: Option<InterviewStatus>) -> Result<i64> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM interviews WHERE (?1 IS NULL OR status = ?1)",
            params![status],
            |row| row.get(0),
        )?)
    }

    /// Count responses, optionally by selected option
    pub fn count_responses(&self, option: Option<ChoiceOption>) -> Result<i64> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM responses WHERE (?1 IS NULL OR selected_option = ?1)",
            params![option],
            |row| row.get(0),
        )?)
    }

    /// Count consultations across all interviews
    pub fn count_all_consultations(&self) -> Result<i64> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM consultations", [], |row| row.get(0))?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Retention Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Delete terminal interviews completed more than `days_old` days ago.
    pub fn cleanup_older_than(&self, days_old: u32, statuses: &[InterviewStatus]) -> Result<usize> {
        let cutoff = now_millis() - i64::from(days_old) * MILLIS_PER_DAY;
        self.cleanup_completed_before(cutoff, statuses)
    }

    /// Delete terminal interviews completed before `cutoff_ms`.
    ///
    /// Responses and consultations go with them (foreign-key cascade).
    /// Interviews without a completion timestamp never match.
    pub fn cleanup_completed_before(
        &self,
        cutoff_ms: i64,
        statuses: &[InterviewStatus],
    ) -> Result<usize> {
        if statuses.is_empty() {
            return Err(Error::validation("at least one status is required for cleanup"));
        }
        if statuses.iter().any(|s| !s.is_terminal()) {
            return Err(Error::validation("active interviews are never cleaned up"));
        }

        let placeholders = (0..statuses.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "DELETE FROM interviews
             WHERE completed_at IS NOT NULL AND completed_at < ?1 AND status IN ({})",
            placeholders
        );
        let mut values: Vec<&dyn ToSql> = vec![&cutoff_ms];
        values.extend(statuses.iter().map(|s| s as &dyn ToSql));

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute(&sql, values.as_slice())?;
        tx.commit()?;

        info!(removed, cutoff_ms, "old interviews cleaned up");
        Ok(removed)
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

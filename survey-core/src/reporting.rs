//! Read-only projections over the store: overall statistics and CSV export.

use chrono::FixedOffset;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::db::{ChoiceOption, Database, Interview, InterviewStatus};
use crate::error::Result;
use crate::time::{file_stamp, format_local, now_millis};

/// Aggregate numbers across every interview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub interviews: i64,
    pub completed_interviews: i64,
    pub responses: i64,
    pub consultations: i64,
    pub choice_a: i64,
    pub choice_b: i64,
    /// Share of A among choice answers, in percent; `None` without choices
    pub choice_a_percent: Option<f64>,
    pub choice_b_percent: Option<f64>,
    pub latest_interview: Option<Interview>,
}

pub fn overall_stats(db: &Database) -> Result<OverallStats> {
    let choice_a = db.count_responses(Some(ChoiceOption::A))?;
    let choice_b = db.count_responses(Some(ChoiceOption::B))?;
    let choices = choice_a + choice_b;
    let percent = |n: i64| (choices > 0).then(|| n as f64 * 100.0 / choices as f64);

    Ok(OverallStats {
        interviews: db.count_interviews(None)?,
        completed_interviews: db.count_interviews(Some(InterviewStatus::Completed))?,
        responses: db.count_responses(None)?,
        consultations: db.count_all_consultations()?,
        choice_a,
        choice_b,
        choice_a_percent: percent(choice_a),
        choice_b_percent: percent(choice_b),
        latest_interview: db.latest_interview()?,
    })
}

/// Files written by [`export_csv`].
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub interviews: PathBuf,
    pub responses: PathBuf,
    pub consultations: PathBuf,
    pub summary: PathBuf,
    pub interview_rows: usize,
    pub response_rows: usize,
    pub consultation_rows: usize,
}

/// Write interviews, responses, consultations and summary metrics as CSV
/// files into `dir`, suffixed with the export time.
pub fn export_csv(db: &Database, dir: &Path, offset: FixedOffset) -> Result<ExportReport> {
    std::fs::create_dir_all(dir)?;
    let stamp = file_stamp(now_millis(), offset);
    let local = |ms: i64| format_local(ms, offset);
    let local_opt = |ms: Option<i64>| ms.map(local).unwrap_or_default();

    let interviews = db.list_interviews()?;
    let mut out = csv_line(&[
        "id",
        "participant_id",
        "display_name",
        "started_at",
        "completed_at",
        "status",
    ]);
    for i in &interviews {
        out.push_str(&csv_line(&[
            &i.id.to_string(),
            &i.participant_id,
            i.display_name.as_deref().unwrap_or(""),
            &local(i.started_at),
            &local_opt(i.completed_at),
            i.status.as_str(),
        ]));
    }
    let interviews_path = dir.join(format!("interviews_{}.csv", stamp));
    std::fs::write(&interviews_path, out)?;

    let responses = db.list_responses_with_questions()?;
    let mut out = csv_line(&[
        "id",
        "interview_id",
        "question_id",
        "question_text",
        "question_type",
        "answer_text",
        "selected_option",
        "consultations_count",
        "created_at",
    ]);
    for row in &responses {
        let r = &row.response;
        out.push_str(&csv_line(&[
            &r.id.to_string(),
            &r.interview_id.to_string(),
            &r.question_id.to_string(),
            row.question_text.as_deref().unwrap_or(""),
            row.question_kind.map(|k| k.as_str()).unwrap_or(""),
            r.answer_text.as_deref().unwrap_or(""),
            r.selected_option.map(|o| o.as_str()).unwrap_or(""),
            &r.consultations_count.to_string(),
            &local(r.created_at),
        ]));
    }
    let responses_path = dir.join(format!("responses_{}.csv", stamp));
    std::fs::write(&responses_path, out)?;

    let consultations = db.list_consultations(None)?;
    let mut out = csv_line(&[
        "id",
        "interview_id",
        "question_id",
        "user_query",
        "advisor_reply",
        "consultation_type",
        "created_at",
    ]);
    for c in &consultations {
        out.push_str(&csv_line(&[
            &c.id.to_string(),
            &c.interview_id.to_string(),
            &c.question_id.to_string(),
            &c.user_query,
            &c.advisor_reply,
            c.consultation_type.as_deref().unwrap_or(""),
            &local(c.created_at),
        ]));
    }
    let consultations_path = dir.join(format!("consultations_{}.csv", stamp));
    std::fs::write(&consultations_path, out)?;

    let stats = overall_stats(db)?;
    let mut out = csv_line(&["metric", "value"]);
    let fmt_percent = |p: Option<f64>| p.map(|v| format!("{:.1}", v)).unwrap_or_default();
    for (metric, value) in [
        ("interviews", stats.interviews.to_string()),
        ("completed_interviews", stats.completed_interviews.to_string()),
        ("responses", stats.responses.to_string()),
        ("consultations", stats.consultations.to_string()),
        ("choice_a", stats.choice_a.to_string()),
        ("choice_b", stats.choice_b.to_string()),
        ("choice_a_percent", fmt_percent(stats.choice_a_percent)),
        ("choice_b_percent", fmt_percent(stats.choice_b_percent)),
        ("exported_at", local(now_millis())),
    ] {
        out.push_str(&csv_line(&[metric, &value]));
    }
    let summary_path = dir.join(format!("summary_{}.csv", stamp));
    std::fs::write(&summary_path, out)?;

    info!(
        dir = %dir.display(),
        interviews = interviews.len(),
        responses = responses.len(),
        consultations = consultations.len(),
        "CSV export written"
    );

    Ok(ExportReport {
        interviews: interviews_path,
        responses: responses_path,
        consultations: consultations_path,
        summary: summary_path,
        interview_rows: interviews.len(),
        response_rows: responses.len(),
        consultation_rows: consultations.len(),
    })
}

/// One CSV record (RFC 4180 quoting), newline-terminated
fn csv_line(fields: &[&str]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            let _ = write!(line, "\"{}\"", field.replace('"', "\"\""));
        } else {
            line.push_str(field);
        }
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewChoiceQuestion, NewConsultation, NewResponse, ADVISOR_CONSULTATION};

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        let q = db
            .create_choice_question(&NewChoiceQuestion {
                text: "Deposit, or fund?".into(),
                market_context: "Rates are high".into(),
                option_a: "Deposit".into(),
                option_b: "Fund".into(),
                ..Default::default()
            })
            .unwrap();
        let interview = db.start_interview("u1", Some("Alice")).unwrap().interview;
        db.record_consultation(
            interview.id,
            q,
            &NewConsultation {
                user_query: "is it \"safe\"?".into(),
                advisor_reply: "Line one\nLine two".into(),
                consultation_type: ADVISOR_CONSULTATION.into(),
            },
        )
        .unwrap();
        db.record_response(interview.id, q, &NewResponse::choice(ChoiceOption::A))
            .unwrap();
        db.complete_interview(interview.id).unwrap();
        db.start_interview("u2", None).unwrap();
        db
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_line(&["a", "b c"]), "a,b c\n");
        assert_eq!(csv_line(&["x,y", "say \"hi\""]), "\"x,y\",\"say \"\"hi\"\"\"\n");
        assert_eq!(csv_line(&["two\nlines"]), "\"two\nlines\"\n");
    }

    #[test]
    fn test_overall_stats() {
        let db = seeded_db();
        let stats = overall_stats(&db).unwrap();
        assert_eq!(stats.interviews, 2);
        assert_eq!(stats.completed_interviews, 1);
        assert_eq!(stats.responses, 1);
        assert_eq!(stats.consultations, 1);
        assert_eq!(stats.choice_a_percent, Some(100.0));
        assert_eq!(stats.choice_b_percent, Some(0.0));
        assert_eq!(stats.latest_interview.unwrap().participant_id, "u2");
    }

    #[test]
    fn test_overall_stats_latest_matches_store() {
        let db = seeded_db();
        let active = db.find_active_interview("u2").unwrap();
        let stats = overall_stats(&db).unwrap();
        assert_eq!(stats.latest_interview, active);
        assert_eq!(stats, overall_stats(&db).unwrap());
    }

    #[test]
    fn test_overall_stats_empty() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        let stats = overall_stats(&db).unwrap();
        assert_eq!(stats.interviews, 0);
        assert_eq!(stats.choice_a_percent, None);
        assert!(stats.latest_interview.is_none());
    }

    #[test]
    fn test_export_writes_four_files() {
        let db = seeded_db();
        let temp_dir = tempfile::tempdir().unwrap();
        let offset = crate::time::offset_from_minutes(180).unwrap();

        let report = export_csv(&db, &temp_dir.path().join("out"), offset).unwrap();
        assert_eq!(report.interview_rows, 2);
        assert_eq!(report.response_rows, 1);
        assert_eq!(report.consultation_rows, 1);

        let responses = std::fs::read_to_string(&report.responses).unwrap();
        assert!(responses.starts_with("id,interview_id,question_id,question_text"));
        assert!(responses.contains("\"Deposit, or fund?\",choice,Product A chosen,A,1,"));

        let consultations = std::fs::read_to_string(&report.consultations).unwrap();
        assert!(consultations.contains("\"is it \"\"safe\"\"?\",\"Line one\nLine two\""));

        let summary = std::fs::read_to_string(&report.summary).unwrap();
        assert!(summary.contains("choice_a_percent,100.0\n"));
        assert!(report.interviews.file_name().unwrap().to_string_lossy().starts_with("interviews_"));
    }
}

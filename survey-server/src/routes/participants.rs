//! Participant status routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use survey_core::StatusSnapshot;

use crate::state::AppState;

/// Create participants router
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/participants/{id}/status", get(get_status))
}

/// Progress of the participant's active interview
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusSnapshot>, (StatusCode, String)> {
    let snapshot = state
        .engine
        .status_snapshot(&id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("No active interview for participant {}", id),
            )
        })?;

    Ok(Json(snapshot))
}

#[cfg(test)]
mod tests {
    use crate::routes::{create_router, test_client};
    use crate::state::test_support::seeded_state;
    use axum::http::StatusCode;
    use survey_core::InboundEvent;

    #[tokio::test]
    async fn test_status_without_interview_is_not_found() {
        let app = create_router(seeded_state());
        let (status, _) = test_client::get(app, "/api/participants/nobody/status").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_reports_pending_text_answer() {
        let state = seeded_state();
        state
            .engine
            .handle("9", InboundEvent::Start { display_name: Some("Bob".into()) })
            .await
            .unwrap();
        state
            .engine
            .handle(
                "9",
                InboundEvent::Button {
                    action: survey_core::Action::Choose {
                        option: survey_core::db::ChoiceOption::A,
                        question_id: 1,
                    },
                },
            )
            .await
            .unwrap();
        state.outbox.take("9").await;

        let (status, body) =
            test_client::get(create_router(state), "/api/participants/9/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["display_name"], "Bob");
        assert_eq!(body["progress"]["answered"], 1);
        assert_eq!(body["progress"]["total"], 2);
        assert_eq!(body["pending"]["kind"], "awaiting_text_answer");
    }
}

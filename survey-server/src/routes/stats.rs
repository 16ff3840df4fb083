//! Aggregate statistics.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use survey_core::reporting::{overall_stats, OverallStats};

use crate::state::AppState;

/// Create stats router
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/stats", get(get_stats))
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OverallStats>, (StatusCode, String)> {
    overall_stats(&state.db)
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::routes::{create_router, test_client};
    use crate::state::test_support::seeded_state;
    use axum::http::StatusCode;
    use survey_core::db::{ChoiceOption, NewResponse};

    #[tokio::test]
    async fn test_stats_counts_choices() {
        let state = seeded_state();
        let interview = state.db.start_interview("5", Some("Eve")).unwrap().interview;
        state
            .db
            .record_response(interview.id, 1, &NewResponse::choice(ChoiceOption::B))
            .unwrap();

        let (status, body) = test_client::get(create_router(state), "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interviews"], 1);
        assert_eq!(body["responses"], 1);
        assert_eq!(body["choice_b"], 1);
        assert_eq!(body["choice_b_percent"], 100.0);
        assert_eq!(body["latest_interview"]["display_name"], "Eve");
    }
}

//! Inbound event webhook.
//!
//! Each POST carries one event for one participant. The response lists
//! every payload the engine rendered while handling it, in order, split
//! to the configured message length.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use survey_core::transport::split_payload;
use survey_core::{InboundEvent, RenderPayload};
use tracing::error;

use crate::state::AppState;

/// Create events router
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", post(post_event))
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub participant_id: String,
    /// Used for `start` events that carry no display name of their own
    #[serde(default)]
    pub display_name: Option<String>,
    pub event: InboundEvent,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub participant_id: String,
    pub payloads: Vec<RenderPayload>,
}

/// Handle one inbound event
pub async fn post_event(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EventRequest>,
) -> Result<Json<EventResponse>, (StatusCode, String)> {
    let participant_id = req.participant_id.trim().to_string();
    if participant_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "participant_id must not be empty".to_string(),
        ));
    }

    let event = match req.event {
        InboundEvent::Start { display_name: None } => InboundEvent::Start {
            display_name: req.display_name,
        },
        other => other,
    };

    let gate = state.request_gate(&participant_id);
    let (handled, rendered) = {
        let _guard = gate.lock().await;
        let handled = state.engine.handle(&participant_id, event).await;
        (handled, state.outbox.take(&participant_id).await)
    };
    state.release_gate(&participant_id, gate);

    if let Err(e) = handled {
        error!(participant_id = %participant_id, "event handling failed: {}", e);
        return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }

    let max = state.config.display.max_message_length;
    let payloads = rendered
        .into_iter()
        .flat_map(|payload| split_payload(payload, max))
        .collect();

    Ok(Json(EventResponse {
        participant_id,
        payloads,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::{create_router, test_client};
    use crate::state::test_support::{seeded_state, seeded_state_with};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_start_returns_welcome_and_first_question() {
        let app = create_router(seeded_state());
        let (status, body) = test_client::post_json(
            app,
            "/api/events",
            json!({
                "participant_id": "42",
                "display_name": "Alice",
                "event": {"type": "start"}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let payloads = body["payloads"].as_array().unwrap();
        assert_eq!(payloads.len(), 2);
        assert!(payloads[0]["text"].as_str().unwrap().contains("Hello, Alice!"));
        assert!(payloads[1]["text"]
            .as_str()
            .unwrap()
            .contains("Where do you keep your savings?"));
        assert_eq!(payloads[1]["actions"][0][0]["payload"], "choose:A:1");
    }

    #[tokio::test]
    async fn test_choice_then_text_answer_flow() {
        let state = seeded_state();

        test_client::post_json(
            create_router(state.clone()),
            "/api/events",
            json!({"participant_id": "7", "event": {"type": "start"}}),
        )
        .await;

        let (status, body) = test_client::post_json(
            create_router(state.clone()),
            "/api/events",
            json!({
                "participant_id": "7",
                "event": {"type": "button", "action": {"action": "choose", "option": "B", "question_id": 1}}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let payloads = body["payloads"].as_array().unwrap();
        assert!(payloads[0]["text"].as_str().unwrap().contains("Bond fund"));
        assert!(payloads[1]["text"].as_str().unwrap().contains("Why?"));

        let (_, body) = test_client::post_json(
            create_router(state.clone()),
            "/api/events",
            json!({"participant_id": "7", "event": {"type": "free_text", "text": "Higher yield"}}),
        )
        .await;
        let texts: Vec<&str> = body["payloads"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["text"].as_str().unwrap())
            .collect();
        assert!(texts[0].contains("Answer: Higher yield"));
        assert!(texts[1].contains("Congratulations!"));

        let interview = state.db.find_active_interview("7").unwrap().unwrap();
        assert_eq!(state.db.progress(interview.id).unwrap().answered, 2);
    }

    #[tokio::test]
    async fn test_long_help_is_split() {
        let mut config = survey_core::SurveyConfig::default();
        config.display.max_message_length = 200;
        let state = seeded_state_with(config);

        let (_, body) = test_client::post_json(
            create_router(state),
            "/api/events",
            json!({"participant_id": "1", "event": {"type": "help"}}),
        )
        .await;
        let payloads = body["payloads"].as_array().unwrap();
        assert!(payloads.len() > 1);
        assert!(payloads[1]["text"].as_str().unwrap().starts_with("(continued)"));
    }

    #[tokio::test]
    async fn test_rejects_blank_participant() {
        let app = create_router(seeded_state());
        let (status, _) = test_client::post_json(
            app,
            "/api/events",
            json!({"participant_id": "  ", "event": {"type": "status"}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_unknown_event_type() {
        let app = create_router(seeded_state());
        let (status, _) = test_client::post_json(
            app,
            "/api/events",
            json!({"participant_id": "1", "event": {"type": "teleport"}}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: HealthComponents,
}

#[derive(Serialize)]
pub struct HealthComponents {
    pub database: bool,
    pub advisor: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let db_healthy = state.db.ping().is_ok();

    let status = if db_healthy { "healthy" } else { "degraded" };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: HealthComponents {
            database: db_healthy,
            // Configured, not reachable; `survey advisor-check` probes the backend
            advisor: state.config.advisor.is_enabled(),
        },
    })
}

#[cfg(test)]
mod tests {
    use crate::routes::{create_router, test_client};
    use crate::state::test_support::seeded_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_reports_database() {
        let app = create_router(seeded_state());
        let (status, body) = test_client::get(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["components"]["database"], true);
        assert_eq!(body["components"]["advisor"], false);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}

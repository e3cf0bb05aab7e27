use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::bootstrap::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub llm: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let llm = llm_check(&state);
    let ready = llm.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("{} sellers on the roster", state.roster.len()),
        },
        llm,
        checked_at: Utc::now().to_rfc3339(),
    };

    // Negotiations stay available without a model: agents fall back to
    // deterministic templates. Degraded is informational, not an outage.
    (StatusCode::OK, Json(payload))
}

fn llm_check(state: &AppState) -> HealthCheck {
    if state.config.llm.api_key.is_some() {
        HealthCheck {
            status: "ready",
            detail: format!("completions via {}", state.config.llm.base_url),
        }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "no api key configured; agent dialogue uses deterministic fallbacks"
                .to_string(),
        }
    }
}

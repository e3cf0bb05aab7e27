use axum::{routing::post, Json, Router};
use serde::Deserialize;

use parley_agent::intake::{ExtractedFields, IntakeExtractor};
use parley_agent::ShoppingIntent;

use crate::bootstrap::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Fields already gathered earlier in the conversation.
    #[serde(default)]
    pub extracted: ExtractedFields,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/api/chat", post(chat)).with_state(state)
}

pub async fn chat(Json(request): Json<ChatRequest>) -> Json<ShoppingIntent> {
    let intent = IntakeExtractor::new().extract(&request.message, &request.extracted);

    tracing::debug!(
        event_name = "chat.intent_extracted",
        ready = intent.ready_for_priority,
        missing = intent.missing_fields.len(),
        "chat message processed"
    );

    Json(intent)
}

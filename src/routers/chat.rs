use axum::{extract::State, Json};
use grounding_protocol::{validated::ValidatedJson, ChatCompletionRequest};
use serde_json::Value;
use tracing::debug;

use crate::{error::GroundingResult, server::AppState};

/// `POST /v1/chat/completions`
pub async fn chat_completions(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ChatCompletionRequest>,
) -> GroundingResult<Json<Value>> {
    debug!(
        model = request.model.as_deref().unwrap_or("default"),
        messages = request.messages.len(),
        "Chat completion request"
    );
    state.backend.chat(request).await.map(Json)
}

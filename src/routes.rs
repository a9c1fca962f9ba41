use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::llm::{self, schema::BotReply, ChatJsonRequest};
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Answer one user message. Malformed model output is absorbed by the
/// recovery ladder and still yields a 200 with a valid reply; transport or
/// configuration failures surface as 502.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatJsonRequest>,
) -> Result<Json<BotReply>, (StatusCode, Json<Value>)> {
    if request.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "message is required"})),
        ));
    }

    match llm::chat_json(state.llm.as_ref(), &state.config, &request).await {
        Ok(reply) => {
            debug!("answered with intent {}", reply.intent.as_str());
            Ok(Json(reply))
        }
        Err(e) => {
            error!("chat completion failed: {:#}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "upstream model call failed"})),
            ))
        }
    }
}

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::JsonBody,
    state::AppState,
};

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/chat/completion", post(chat_completion))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub role: &'static str,
    pub content: String,
}

/// Stateless: nothing is read from or written to the database.
#[instrument(skip(state, body))]
pub async fn chat_completion(
    caller: AuthUser,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ChatRequest>,
) -> AppResult<Json<ChatReply>> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::invalid("message must not be blank"));
    }
    let content = state.chat.complete(message).await?;
    info!(user_id = %caller.id, reply_len = content.len(), "chat reply");
    Ok(Json(ChatReply {
        role: "assistant",
        content,
    }))
}

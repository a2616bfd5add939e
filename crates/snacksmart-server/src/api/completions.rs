use crate::api::{ApiError, state::AppState};
use axum::{
    Extension, Json,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use snacksmart_ai::{CompletionRequest, Message};
use snacksmart_core::CoreError;
use snacksmart_core::auth::AuthContext;

pub const EMPTY_MESSAGES_ERROR: &str = "Nincsenek üzenetek.";

#[derive(Debug, Deserialize)]
pub struct ChatProxyRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Upstream context for the raw proxy: the system prompt and the latest
/// message only.
pub fn proxy_context(system_prompt: &str, messages: &[Message]) -> Option<Vec<Message>> {
    let last = messages.last()?;
    Some(vec![
        Message::system(system_prompt),
        Message {
            role: last.role,
            content: last.content.trim().to_string(),
        },
    ])
}

// POST /api/chat
//
// Pipes the upstream SSE bytes to the caller untouched.
pub async fn stream_chat(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<ChatProxyRequest>,
) -> Result<Response, ApiError> {
    let Some(context) = proxy_context(state.system_prompt(), &request.messages) else {
        return Err(CoreError::validation(EMPTY_MESSAGES_ERROR).into());
    };

    tracing::debug!(user_id = %ctx.user_id, "Opening proxied completion stream");
    let body = state
        .llm()
        .open_stream(CompletionRequest::new(context))
        .await
        .map_err(CoreError::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

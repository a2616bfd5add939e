use crate::api::{ApiResponse, ApiResult, state::AppState};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use snacksmart_core::auth::AuthContext;
use snacksmart_core::{Message, MessageRole};

#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    #[serde(default = "default_role")]
    pub role: MessageRole,
    pub content: String,
}

fn default_role() -> MessageRole {
    MessageRole::User
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub content: String,
}

// GET /api/chats/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(chat_id): Path<String>,
) -> ApiResult<Vec<Message>> {
    Ok(Json(ApiResponse::ok(state.chats.list_messages(&ctx, &chat_id)?)))
}

// POST /api/chats/{id}/messages
pub async fn add_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(chat_id): Path<String>,
    Json(request): Json<AddMessageRequest>,
) -> ApiResult<Message> {
    let message = state
        .chats
        .add_message(&ctx, &chat_id, request.role, &request.content)?;
    Ok(Json(ApiResponse::ok(message)))
}

// PATCH /api/messages/{id}
pub async fn update_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(message_id): Path<String>,
    Json(request): Json<UpdateMessageRequest>,
) -> ApiResult<Message> {
    let message = state
        .chats
        .update_message(&ctx, &message_id, &request.content)?;
    Ok(Json(ApiResponse::ok_with_message(message, "Message updated")))
}

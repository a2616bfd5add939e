use crate::api::{ApiError, ApiResponse, state::AppState};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use snacksmart_core::auth::AuthContext;
use snacksmart_core::services::{ProfileChat, SendOutcome};
use snacksmart_core::{Chat, Message, UserProfile};

use super::ApiResult;

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileChatResponse {
    pub chat: Chat,
    pub message: Message,
}

impl From<ProfileChat> for ProfileChatResponse {
    fn from(created: ProfileChat) -> Self {
        Self {
            chat: created.chat,
            message: created.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendAccepted {
    pub chat_id: String,
    pub user_message_id: String,
    pub assistant_message_id: String,
}

// GET /api/chats
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Vec<Chat>> {
    Ok(Json(ApiResponse::ok(state.chats.list_chats(&ctx)?)))
}

// POST /api/chats
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<CreateChatRequest>,
) -> ApiResult<Chat> {
    let chat = state.chats.create_chat(&ctx, &request.title)?;
    Ok(Json(ApiResponse::ok(chat)))
}

// POST /api/chats/profile
pub async fn start_profile_chat(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(profile): Json<UserProfile>,
) -> ApiResult<ProfileChatResponse> {
    let created = state.chats.start_profile_chat(&ctx, &profile)?;
    Ok(Json(ApiResponse::ok(created.into())))
}

// POST /api/chats/{id}/send
//
// Stores the user message and placeholder, then streams the reply into the
// placeholder in the background. Clients poll the message list to follow it.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(chat_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SendAccepted>>), ApiError> {
    let pending = state.chats.begin_send(&ctx, &chat_id, &request.content)?;
    let accepted = SendAccepted {
        chat_id: pending.chat_id().to_string(),
        user_message_id: pending.user_message().id.clone(),
        assistant_message_id: pending.placeholder().id.clone(),
    };

    tokio::spawn(async move {
        match pending.run().await {
            Ok(SendOutcome::Completed { message, relay }) => tracing::debug!(
                message_id = %message.id,
                deltas = relay.deltas,
                partial_commits = relay.partial_commits,
                "Reply stored"
            ),
            Ok(SendOutcome::Failed { message, error }) => tracing::warn!(
                message_id = %message.id,
                error = %error,
                "Reply failed"
            ),
            Err(err) => tracing::error!(error = %err, "Failed to store reply"),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::ok(accepted))))
}

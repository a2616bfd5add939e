use crate::api::{ApiResponse, ApiResult, state::AppState};
use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use snacksmart_core::auth::AuthContext;
use snacksmart_core::{AuthSession, PublicUser};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<AuthSession> {
    let session = state
        .auth
        .signup(&request.email, &request.name, &request.password)
        .await?;
    tracing::info!(user_id = %session.user.id, "User signed up");
    Ok(Json(ApiResponse::ok(session)))
}

// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<AuthSession> {
    let session = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(ApiResponse::ok(session)))
}

// GET /api/me
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<PublicUser> {
    Ok(Json(ApiResponse::ok(state.auth.current_user(&ctx)?)))
}

pub mod auth;
pub mod chats;
pub mod completions;
pub mod messages;
pub mod response;
pub mod state;

pub use response::{ApiError, ApiResponse, ApiResult};

use axum::{
    Json, Router,
    http::{Method, header},
    middleware,
    routing::{get, patch, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware::require_auth;
use state::AppState;

#[derive(Serialize)]
struct Health {
    status: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "snacksmart is working!".to_string(),
    })
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/me", get(auth::me))
        // Chats
        .route("/api/chats", get(chats::list_chats).post(chats::create_chat))
        .route("/api/chats/profile", post(chats::start_profile_chat))
        .route("/api/chats/{id}/send", post(chats::send_message))
        // Messages
        .route(
            "/api/chats/{id}/messages",
            get(messages::list_messages).post(messages::add_message),
        )
        .route("/api/messages/{id}", patch(messages::update_message))
        // Raw streaming proxy
        .route("/api/chat", post(completions::stream_chat))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .layer(cors_layer())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use snacksmart_ai::{MockLlmClient, MockStep};
    use snacksmart_core::auth::AuthSettings;
    use snacksmart_core::services::FAILURE_REPLY;
    use snacksmart_core::{AppCore, CoreSettings};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;

    async fn test_app(llm: MockLlmClient) -> (Router, TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("api.db");
        let settings = CoreSettings::new(AuthSettings::new("router-test-secret"));
        let core = AppCore::new(db_path.to_str().unwrap(), settings, Arc::new(llm))
            .await
            .unwrap();
        (router(Arc::new(core)), dir)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn call_json(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = call(app, method, uri, token, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn signup(app: &Router, email: &str) -> String {
        let (status, body) = call_json(
            app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": email, "name": "Teszt Elek", "password": "hosszu-jelszo"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn create_chat(app: &Router, token: &str) -> String {
        let (status, body) = call_json(
            app,
            "POST",
            "/api/chats",
            Some(token),
            Some(json!({"title": "Étrend"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn wait_for_reply(app: &Router, token: &str, chat_id: &str, expected: &str) -> Value {
        let uri = format!("/api/chats/{chat_id}/messages");
        for _ in 0..200 {
            let (_, body) = call_json(app, "GET", &uri, Some(token), None).await;
            let messages = body["data"].as_array().unwrap().clone();
            if messages.last().and_then(|m| m["content"].as_str()) == Some(expected) {
                return Value::Array(messages);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reply {expected:?} never stored");
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _dir) = test_app(MockLlmClient::new("mock")).await;
        let (status, body) = call_json(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "snacksmart is working!");
    }

    #[tokio::test]
    async fn test_signup_login_and_me() {
        let (app, _dir) = test_app(MockLlmClient::new("mock")).await;
        signup(&app, "anna@example.com").await;

        let (status, body) = call_json(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ANNA@example.com", "password": "hosszu-jelszo"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let (status, body) = call_json(&app, "GET", "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "anna@example.com");
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_auth_failures() {
        let (app, _dir) = test_app(MockLlmClient::new("mock")).await;
        signup(&app, "anna@example.com").await;

        let (status, body) = call_json(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": "anna@example.com", "name": "Anna", "password": "hosszu-jelszo"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        let (status, _) = call_json(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "anna@example.com", "password": "rossz-jelszo"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call_json(&app, "GET", "/api/chats", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call_json(&app, "GET", "/api/chats", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_chats_are_private_to_their_owner() {
        let (app, _dir) = test_app(MockLlmClient::new("mock")).await;
        let owner = signup(&app, "owner@example.com").await;
        let other = signup(&app, "other@example.com").await;
        let chat_id = create_chat(&app, &owner).await;

        let uri = format!("/api/chats/{chat_id}/messages");
        let (status, _) = call_json(&app, "GET", &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call_json(&app, "GET", "/api/chats/missing/messages", Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call_json(&app, "GET", "/api/chats", Some(&other), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_add_and_update_message() {
        let (app, _dir) = test_app(MockLlmClient::new("mock")).await;
        let token = signup(&app, "anna@example.com").await;
        let chat_id = create_chat(&app, &token).await;

        let uri = format!("/api/chats/{chat_id}/messages");
        let (status, body) = call_json(&app, "POST", &uri, Some(&token), Some(json!({"content": "Szia"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["role"], "user");
        let message_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call_json(
            &app,
            "PATCH",
            &format!("/api/messages/{message_id}"),
            Some(&token),
            Some(json!({"content": "Szia!"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["content"], "Szia!");

        let (status, _) = call_json(&app, "POST", &uri, Some(&token), Some(json!({"content": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_profile_chat_opens_with_profile_message() {
        let (app, _dir) = test_app(MockLlmClient::new("mock")).await;
        let token = signup(&app, "anna@example.com").await;

        let profile = json!({
            "gender": "female",
            "goal": "cut",
            "age": 31,
            "weight_kg": 68.0,
            "target_weight_kg": 62.0,
            "height_cm": 168.0,
            "workouts_per_week": 3
        });
        let (status, body) = call_json(&app, "POST", "/api/chats/profile", Some(&token), Some(profile)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["message"]["role"], "user");
        assert_eq!(body["data"]["message"]["chat_id"], body["data"]["chat"]["id"]);
    }

    #[tokio::test]
    async fn test_send_streams_reply_into_placeholder() {
        let llm = MockLlmClient::from_steps("mock", vec![MockStep::deltas(["Zab", "kása."])]);
        let (app, _dir) = test_app(llm).await;
        let token = signup(&app, "anna@example.com").await;
        let chat_id = create_chat(&app, &token).await;

        let (status, body) = call_json(
            &app,
            "POST",
            &format!("/api/chats/{chat_id}/send"),
            Some(&token),
            Some(json!({"content": "Mit egyek?"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED, "{body}");
        let assistant_id = body["data"]["assistant_message_id"].as_str().unwrap().to_string();

        let messages = wait_for_reply(&app, &token, &chat_id, "Zabkása.").await;
        let messages = messages.as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "Mit egyek?");
        assert_eq!(messages[1]["id"], assistant_id.as_str());
    }

    #[tokio::test]
    async fn test_send_failure_stores_failure_reply() {
        let llm = MockLlmClient::from_steps("mock", vec![MockStep::status(500, "boom")]);
        let (app, _dir) = test_app(llm).await;
        let token = signup(&app, "anna@example.com").await;
        let chat_id = create_chat(&app, &token).await;

        let (status, _) = call_json(
            &app,
            "POST",
            &format!("/api/chats/{chat_id}/send"),
            Some(&token),
            Some(json!({"content": "Szia"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        wait_for_reply(&app, &token, &chat_id, FAILURE_REPLY).await;
    }

    #[tokio::test]
    async fn test_raw_proxy_rejects_empty_messages() {
        let (app, _dir) = test_app(MockLlmClient::new("mock")).await;
        let token = signup(&app, "anna@example.com").await;

        let (status, body) = call_json(&app, "POST", "/api/chat", Some(&token), Some(json!({"messages": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], completions::EMPTY_MESSAGES_ERROR);
    }

    #[tokio::test]
    async fn test_raw_proxy_pipes_upstream_bytes() {
        let llm = MockLlmClient::from_steps("mock", vec![MockStep::deltas(["Hello", " world"])]);
        let (app, _dir) = test_app(llm.clone()).await;
        let token = signup(&app, "anna@example.com").await;

        let (status, bytes) = call(
            &app,
            "POST",
            "/api/chat",
            Some(&token),
            Some(json!({"messages": [
                {"role": "user", "content": "régi"},
                {"role": "user", "content": " új "}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"Hello\""));
        assert!(text.contains("[DONE]"));

        let request = &llm.requests().await[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content, "új");
    }
}

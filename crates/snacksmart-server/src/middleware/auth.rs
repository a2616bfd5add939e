use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::{ApiResponse, state::AppState};

/// Resolves the bearer token into an `AuthContext` request extension.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = extract_bearer(req.headers().get(AUTHORIZATION)) else {
        return unauthorized("Missing bearer token");
    };

    match state.auth.verify(&token) {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "Rejected bearer token");
            unauthorized("Invalid or expired token")
        }
    }
}

fn extract_bearer(header: Option<&HeaderValue>) -> Option<String> {
    let value = header?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()>::error(message)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer() {
        let header = HeaderValue::from_static("Bearer abc.def");
        assert_eq!(extract_bearer(Some(&header)).as_deref(), Some("abc.def"));

        let lower = HeaderValue::from_static("bearer  xyz ");
        assert_eq!(extract_bearer(Some(&lower)).as_deref(), Some("xyz"));

        let basic = HeaderValue::from_static("Basic dXNlcg==");
        assert_eq!(extract_bearer(Some(&basic)), None);

        let empty = HeaderValue::from_static("Bearer ");
        assert_eq!(extract_bearer(Some(&empty)), None);
        assert_eq!(extract_bearer(None), None);
    }
}

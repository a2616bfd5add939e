//! xAI (OpenAI-compatible) chat completion provider

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::client::{ByteStream, CompletionRequest, LlmClient, Message, SearchParameters};
use crate::llm::retry::{LlmRetryConfig, response_to_error};

pub const DEFAULT_XAI_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_XAI_MODEL: &str = "grok-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Streaming chat completion client for xAI and other OpenAI-compatible APIs
pub struct XaiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    live_search: bool,
    retry_config: LlmRetryConfig,
}

impl XaiClient {
    /// Create a new xAI client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key.into(),
            model: DEFAULT_XAI_MODEL.to_string(),
            base_url: DEFAULT_XAI_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            live_search: true,
            retry_config: LlmRetryConfig::default(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Temperature used when the request does not set one
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Live search default used when the request does not set one
    pub fn with_search(mut self, enable: bool) -> Self {
        self.live_search = enable;
        self
    }

    pub fn with_retry_config(mut self, config: LlmRetryConfig) -> Self {
        self.retry_config = config;
        self
    }
}

#[derive(Serialize)]
struct XaiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    search_parameters: SearchParameters,
}

#[async_trait]
impl LlmClient for XaiClient {
    fn provider(&self) -> &str {
        "xai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn open_stream(&self, request: CompletionRequest) -> Result<ByteStream> {
        let body = XaiRequest {
            model: &self.model,
            messages: &request.messages,
            stream: true,
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: request.max_tokens,
            search_parameters: request.search.unwrap_or(SearchParameters {
                enable: self.live_search,
            }),
        };

        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            let response = match self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .header("Accept", "text/event-stream")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    let error = AiError::Http(e);
                    if !error.is_retryable() || attempt == self.retry_config.max_retries {
                        return Err(error);
                    }
                    let delay = self.retry_config.delay_for(attempt + 1, None);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis(),
                        "Retrying xAI request after connection error"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(error);
                    continue;
                }
            };

            if response.status().is_success() {
                tracing::debug!(
                    model = %self.model,
                    messages = request.messages.len(),
                    "xAI stream opened"
                );
                let stream = response
                    .bytes_stream()
                    .map_err(|e| AiError::Stream(e.to_string()));
                return Ok(Box::pin(stream));
            }

            let error = response_to_error(response, "xAI").await;
            if !error.is_retryable() || attempt == self.retry_config.max_retries {
                return Err(error);
            }

            let delay = self
                .retry_config
                .delay_for(attempt + 1, error.retry_after());
            tracing::warn!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis(),
                "Retrying xAI request"
            );
            tokio::time::sleep(delay).await;
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| AiError::Llm("xAI request failed after retries".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fast_retries() -> LlmRetryConfig {
        LlmRetryConfig {
            max_retries: 2,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 1.0,
        }
    }

    fn sse_body() -> String {
        [
            r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#,
            "",
            r#"data: {"choices":[{"delta":{"content":" world"}}]}"#,
            "",
            "data: [DONE]",
            "",
            "",
        ]
        .join("\n")
    }

    async fn collect(stream: ByteStream) -> String {
        let chunks: Vec<bytes::Bytes> = stream.try_collect().await.unwrap();
        let bytes: Vec<u8> = chunks.iter().flat_map(|chunk| chunk.to_vec()).collect();
        String::from_utf8(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_open_stream_posts_streaming_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "grok-4",
                "stream": true,
                "temperature": 0.7,
                "search_parameters": { "enable": true },
                "messages": [
                    { "role": "system", "content": "be helpful" },
                    { "role": "user", "content": "hi" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = XaiClient::new("test-key").with_base_url(server.uri());
        let request = CompletionRequest::new(vec![Message::system("be helpful"), Message::user("hi")])
            .with_temperature(0.7)
            .with_search(true);

        let stream = client.open_stream(request).await.unwrap();
        assert_eq!(collect(stream).await, sse_body());
    }

    #[tokio::test]
    async fn test_client_defaults_fill_unset_request_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "grok-3-mini",
                "temperature": 0.2,
                "search_parameters": { "enable": false }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(sse_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = XaiClient::new("test-key")
            .with_base_url(format!("{}/", server.uri()))
            .with_model("grok-3-mini")
            .with_temperature(0.2)
            .with_search(false);

        let stream = client
            .open_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(collect(stream).await, sse_body());
    }

    #[tokio::test]
    async fn test_default_client_always_sends_temperature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "grok-4",
                "temperature": 0.7,
                "search_parameters": { "enable": true }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(sse_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = XaiClient::new("test-key").with_base_url(server.uri());
        let stream = client
            .open_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(collect(stream).await, sse_body());
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_retried_when_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = XaiClient::new("bad-key")
            .with_base_url(server.uri())
            .with_retry_config(fast_retries());

        let error = client
            .open_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .await
            .err()
            .unwrap();

        match error {
            AiError::LlmHttp {
                provider,
                status,
                message,
                ..
            } => {
                assert_eq!(provider, "xAI");
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sse_body()))
            .with_priority(2)
            .mount(&server)
            .await;

        let client = XaiClient::new("test-key")
            .with_base_url(server.uri())
            .with_retry_config(fast_retries());

        let stream = client
            .open_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(collect(stream).await, sse_body());
    }

    #[tokio::test]
    async fn test_retries_exhausted_returns_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let client = XaiClient::new("test-key")
            .with_base_url(server.uri())
            .with_retry_config(fast_retries());

        let error = client
            .open_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .await
            .err()
            .unwrap();
        assert!(matches!(error, AiError::LlmHttp { status: 500, .. }));
    }
}

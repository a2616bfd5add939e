//! Deterministic mock LLM client for relay and chat flow tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use crate::error::{AiError, Result};

use super::{ByteStream, CompletionRequest, LlmClient, Role};

/// Render one OpenAI-style SSE frame carrying a content delta.
pub fn sse_frame(content: &str) -> String {
    let payload = serde_json::json!({
        "choices": [{ "index": 0, "delta": { "content": content } }]
    });
    format!("data: {payload}\n\n")
}

pub const SSE_DONE: &str = "data: [DONE]\n\n";

/// One scripted event inside a mock response body.
#[derive(Debug, Clone)]
pub enum MockEvent {
    /// Deliver these bytes as a single transport chunk.
    Bytes(Bytes),
    /// Pause before the next event.
    Sleep(u64),
    /// Fail the body stream mid-flight.
    Fail(String),
}

impl MockEvent {
    pub fn text(chunk: impl Into<String>) -> Self {
        Self::Bytes(Bytes::from(chunk.into()))
    }
}

/// Deterministic step for scripted mock completions.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    /// Open successfully and play the events as the response body.
    Stream(Vec<MockEvent>),
    /// Reject the request with an upstream status before any body.
    Status { status: u16, message: String },
}

/// Scripted completion step with optional delay before the stream opens.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub delay_ms: u64,
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn stream(events: Vec<MockEvent>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Stream(events),
        }
    }

    /// One chunk per delta, terminated by `[DONE]`.
    pub fn deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut events: Vec<MockEvent> = deltas
            .into_iter()
            .map(|delta| MockEvent::text(sse_frame(delta.as_ref())))
            .collect();
        events.push(MockEvent::text(SSE_DONE));
        Self::stream(events)
    }

    /// Like [`MockStep::deltas`] with a pause before every chunk.
    pub fn paced_deltas<I, S>(deltas: I, every_ms: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut events = Vec::new();
        for delta in deltas {
            events.push(MockEvent::Sleep(every_ms));
            events.push(MockEvent::text(sse_frame(delta.as_ref())));
        }
        events.push(MockEvent::text(SSE_DONE));
        Self::stream(events)
    }

    /// Whole body delivered as one chunk.
    pub fn raw(body: impl Into<String>) -> Self {
        Self::stream(vec![MockEvent::text(body)])
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Status {
                status,
                message: message.into(),
            },
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// A deterministic mock LLM client driven by scripted steps.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            requests: Arc::default(),
        }
    }

    pub async fn push_step(&self, step: MockStep) {
        self.script.lock().await.push_back(step);
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_step(&self) -> Option<MockStep> {
        self.script.lock().await.pop_front()
    }

    fn fallback_step(request: &CompletionRequest) -> MockStep {
        let text = request
            .messages
            .iter()
            .rev()
            .find(|msg| matches!(msg.role, Role::User))
            .map(|msg| format!("mock-echo: {}", msg.content))
            .unwrap_or_else(|| "mock-ok".to_string());
        MockStep::deltas([text])
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn open_stream(&self, request: CompletionRequest) -> Result<ByteStream> {
        let step = match self.next_step().await {
            Some(step) => step,
            None => Self::fallback_step(&request),
        };
        self.requests.lock().await.push(request);

        if step.delay_ms > 0 {
            sleep(Duration::from_millis(step.delay_ms)).await;
        }

        let events = match step.kind {
            MockStepKind::Status { status, message } => {
                return Err(AiError::LlmHttp {
                    provider: "mock".to_string(),
                    status,
                    message,
                    retry_after_secs: None,
                });
            }
            MockStepKind::Stream(events) => events,
        };

        let body = stream! {
            for event in events {
                match event {
                    MockEvent::Bytes(bytes) => yield Ok::<Bytes, AiError>(bytes),
                    MockEvent::Sleep(ms) => sleep(Duration::from_millis(ms)).await,
                    MockEvent::Fail(message) => {
                        yield Err(AiError::Stream(message));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(body))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::llm::Message;

    async fn drain(mut body: ByteStream) -> (String, Option<AiError>) {
        let mut text = String::new();
        while let Some(item) = body.next().await {
            match item {
                Ok(bytes) => text.push_str(std::str::from_utf8(&bytes).unwrap()),
                Err(error) => return (text, Some(error)),
            }
        }
        (text, None)
    }

    #[tokio::test]
    async fn test_scripted_steps_play_in_order() {
        let client = MockLlmClient::from_steps(
            "mock-model",
            vec![MockStep::deltas(["a", "b"]), MockStep::raw("data: x\n")],
        );

        let request = CompletionRequest::new(vec![Message::user("hi")]);
        let (first, error) = drain(client.open_stream(request.clone()).await.unwrap()).await;
        assert!(error.is_none());
        assert_eq!(first, format!("{}{}{}", sse_frame("a"), sse_frame("b"), SSE_DONE));

        let (second, _) = drain(client.open_stream(request).await.unwrap()).await;
        assert_eq!(second, "data: x\n");
        assert_eq!(client.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_status_step_fails_before_body() {
        let client = MockLlmClient::from_steps("m", vec![MockStep::status(502, "bad gateway")]);
        let error = client
            .open_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .await
            .err()
            .unwrap();
        assert!(matches!(error, AiError::LlmHttp { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_fail_event_ends_stream_with_error() {
        let client = MockLlmClient::from_steps(
            "m",
            vec![MockStep::stream(vec![
                MockEvent::text(sse_frame("partial")),
                MockEvent::Fail("connection reset".to_string()),
                MockEvent::text(sse_frame("never")),
            ])],
        );
        let body = client
            .open_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .await
            .unwrap();
        let (text, error) = drain(body).await;
        assert_eq!(text, sse_frame("partial"));
        assert!(matches!(error, Some(AiError::Stream(_))));
    }

    #[tokio::test]
    async fn test_empty_script_echoes_last_user_message() {
        let client = MockLlmClient::new("m");
        let body = client
            .open_stream(CompletionRequest::new(vec![
                Message::system("sys"),
                Message::user("ping"),
            ]))
            .await
            .unwrap();
        let (text, _) = drain(body).await;
        assert!(text.starts_with(&sse_frame("mock-echo: ping")));
    }
}

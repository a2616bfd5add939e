//! LLM client abstractions

mod client;
mod mock_client;
mod retry;
mod xai;

pub use client::{ByteStream, CompletionRequest, LlmClient, Message, Role, SearchParameters};
pub use mock_client::{MockEvent, MockLlmClient, MockStep, MockStepKind, SSE_DONE, sse_frame};
pub use retry::{LlmRetryConfig, parse_retry_after, response_to_error};
pub use xai::{DEFAULT_TEMPERATURE, DEFAULT_XAI_BASE_URL, DEFAULT_XAI_MODEL, XaiClient};

//! SnackSmart AI - upstream text generation and stream relaying
//!
//! This crate provides:
//! - An OpenAI-compatible chat completion client that returns the raw
//!   server-sent-event byte stream (xAI by default)
//! - A scripted mock client for tests
//! - The stream relay: incremental SSE decoding, delta accumulation and
//!   throttled persistence commits

pub mod error;
mod http_client;
pub mod llm;
pub mod relay;

// Re-export commonly used types
pub use error::{AiError, Result};
pub use llm::{
    ByteStream, CompletionRequest, LlmClient, LlmRetryConfig, Message, MockEvent, MockLlmClient, MockStep,
    Role, SearchParameters, XaiClient,
};
pub use relay::{
    CommitSink, DEFAULT_EMPTY_REPLY, RelayConfig, RelayOutcome, StreamRelay, Throttle, should_fire,
};

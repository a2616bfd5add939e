//! Error types for the AI module

use thiserror::Error;

/// AI module error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{provider} API error ({status}): {message}")]
    LlmHttp {
        provider: String,
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Commit error: {0}")]
    Commit(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AiError {
    /// Whether opening the upstream request again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::LlmHttp { status, .. } => matches!(status, 408 | 429 | 500..=599),
            AiError::Http(error) => error.is_connect() || error.is_timeout(),
            AiError::Llm(message) => {
                let message = message.to_ascii_lowercase();
                message.contains("rate limit")
                    || message.contains("timeout")
                    || message.contains("overloaded")
            }
            _ => false,
        }
    }

    /// Server-provided delay before the next attempt, in seconds.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            AiError::LlmHttp {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Result type alias for AI operations
pub type Result<T> = std::result::Result<T, AiError>;

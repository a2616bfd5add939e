//! Retry policy for opening the upstream completion stream.
//!
//! Only the request that opens the stream is retried. Once the first body
//! bytes arrive the relay owns the stream and a failure ends the reply.

use std::time::Duration;

use reqwest::Response;

use crate::error::AiError;

/// Error bodies longer than this are cut before they reach logs or messages.
const MAX_ERROR_BODY: usize = 512;

/// Backoff between attempts to open a stream
#[derive(Debug, Clone)]
pub struct LlmRetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for LlmRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl LlmRetryConfig {
    /// Open the stream once and surface the first failure.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Wait before retry number `attempt` (1-based). A `Retry-After` hint from
    /// the upstream wins over the exponential schedule, within the same cap.
    pub fn delay_for(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        let cap = Duration::from_millis(self.max_delay_ms);
        match retry_after_secs {
            Some(seconds) => Duration::from_secs(seconds).min(cap),
            None => {
                let exponent = attempt.saturating_sub(1) as i32;
                let millis = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
                Duration::from_millis(millis as u64).min(cap)
            }
        }
    }
}

/// Seconds from a numeric `Retry-After` header; HTTP-date values are ignored.
pub fn parse_retry_after(response: &Response) -> Option<u64> {
    let value = response.headers().get(reqwest::header::RETRY_AFTER)?;
    value.to_str().ok()?.trim().parse().ok()
}

/// Turn a non-success response from the completions endpoint into an error.
pub async fn response_to_error(response: Response, provider: &str) -> AiError {
    let status = response.status().as_u16();
    let retry_after_secs = parse_retry_after(&response);
    let body = response.text().await.unwrap_or_default();

    AiError::LlmHttp {
        provider: provider.to_string(),
        status,
        message: truncate_error_body(body),
        retry_after_secs,
    }
}

fn truncate_error_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let end = (0..=MAX_ERROR_BODY)
        .rev()
        .find(|index| body.is_char_boundary(*index))
        .unwrap_or(0);
    format!("{}... [truncated]", &body[..end])
}

//! Stream relay: turns a streamed chat completion body into persisted text.
//!
//! The relay reads the upstream SSE body chunk by chunk, accumulates the
//! `choices[0].delta.content` fragments and commits the text through a
//! [`CommitSink`]: throttled partial commits while text arrives, then one
//! final commit once the body ends.

mod commit;
mod decoder;
mod frame;
mod throttle;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;

use crate::error::{AiError, Result};
use crate::llm::ByteStream;

use commit::CommitQueue;

pub use commit::CommitSink;
pub use decoder::{LineBuffer, SseDecoder, Utf8Decoder};
pub use frame::delta_from_line;
pub use throttle::{DEFAULT_THROTTLE_INTERVAL, Throttle, should_fire};

/// Text committed when the upstream produced no usable content.
pub const DEFAULT_EMPTY_REPLY: &str = "Elnézést, nem sikerült választ generálni.";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Minimum spacing between partial commits (exclusive).
    pub throttle_interval: Duration,
    /// Committed instead of an empty or whitespace-only reply.
    pub empty_reply: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
            empty_reply: DEFAULT_EMPTY_REPLY.to_string(),
        }
    }
}

/// Result of a completed relay session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Concatenation of every received delta.
    pub text: String,
    /// What the final commit wrote.
    pub committed: String,
    /// Number of non-empty deltas received.
    pub deltas: usize,
    /// Number of partial commits that reached the sink.
    pub partial_commits: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StreamRelay {
    config: RelayConfig,
}

impl StreamRelay {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Drive one relay session to completion.
    ///
    /// On a transport error pending partial commits are discarded, no final
    /// commit is written and [`AiError::Stream`] is returned.
    pub async fn relay(&self, mut body: ByteStream, sink: Arc<dyn CommitSink>) -> Result<RelayOutcome> {
        let mut throttle = Throttle::new(self.config.throttle_interval);
        let mut decoder = SseDecoder::default();
        let queue = CommitQueue::spawn(sink);

        let mut text = String::new();
        let mut deltas = 0usize;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) => {
                    tracing::warn!(%error, deltas, "Upstream stream failed, aborting relay");
                    queue.abort().await;
                    return Err(match error {
                        AiError::Stream(_) => error,
                        other => AiError::Stream(other.to_string()),
                    });
                }
            };

            for line in decoder.feed(&chunk) {
                let Some(delta) = delta_from_line(&line) else {
                    continue;
                };
                text.push_str(&delta);
                deltas += 1;

                if throttle.ready(Instant::now()) {
                    queue.partial(text.clone());
                }
            }
        }

        if let Some(line) = decoder.finish()
            && let Some(delta) = delta_from_line(&line)
        {
            text.push_str(&delta);
            deltas += 1;
        }

        let committed = if text.trim().is_empty() {
            self.config.empty_reply.clone()
        } else {
            text.clone()
        };
        let partial_commits = queue.finish(committed.clone()).await?;

        tracing::debug!(
            deltas,
            partial_commits,
            chars = committed.chars().count(),
            "Relay finished"
        );

        Ok(RelayOutcome {
            text,
            committed,
            deltas,
            partial_commits,
        })
    }
}

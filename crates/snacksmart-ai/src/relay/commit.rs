use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{AiError, Result};

/// Destination of relayed text.
#[async_trait]
pub trait CommitSink: Send + Sync {
    /// Store the text received so far. Failures are logged and tolerated.
    async fn persist_partial(&self, text: &str) -> Result<()>;

    /// Store the final text. Called exactly once per successful relay.
    async fn persist_final(&self, text: &str) -> Result<()>;
}

enum CommitJob {
    Partial(String),
    Final(String, oneshot::Sender<Result<()>>),
}

/// Serialises the commits of one relay session on a single worker task.
///
/// Partials queued while an earlier commit is still running collapse into
/// the most recent one. The final commit runs after every partial enqueued
/// before it.
pub(crate) struct CommitQueue {
    sender: mpsc::UnboundedSender<CommitJob>,
    aborted: Arc<AtomicBool>,
    worker: JoinHandle<usize>,
}

impl CommitQueue {
    pub(crate) fn spawn(sink: Arc<dyn CommitSink>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let aborted = Arc::new(AtomicBool::new(false));
        let worker = tokio::spawn(run_worker(sink, receiver, aborted.clone()));
        Self {
            sender,
            aborted,
            worker,
        }
    }

    /// Enqueue a partial commit without waiting for it.
    pub(crate) fn partial(&self, text: String) {
        if self.sender.send(CommitJob::Partial(text)).is_err() {
            tracing::warn!("Commit worker stopped, dropping partial commit");
        }
    }

    /// Enqueue the final commit and wait for it. Returns the number of
    /// partial commits that were written.
    pub(crate) async fn finish(self, text: String) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(CommitJob::Final(text, reply_tx))
            .map_err(|_| AiError::Commit("commit worker stopped".to_string()))?;
        drop(self.sender);

        let outcome = reply_rx
            .await
            .map_err(|_| AiError::Commit("commit worker dropped the final commit".to_string()))?;
        let partials = self
            .worker
            .await
            .map_err(|e| AiError::Commit(format!("commit worker panicked: {e}")))?;
        outcome.map(|()| partials)
    }

    /// Discard pending partials and wait for an in-flight commit to settle.
    pub(crate) async fn abort(self) {
        self.aborted.store(true, Ordering::SeqCst);
        drop(self.sender);
        if let Err(error) = self.worker.await {
            tracing::warn!(%error, "Commit worker panicked during abort");
        }
    }
}

async fn run_worker(
    sink: Arc<dyn CommitSink>,
    mut receiver: mpsc::UnboundedReceiver<CommitJob>,
    aborted: Arc<AtomicBool>,
) -> usize {
    let mut written = 0;
    let mut next = receiver.recv().await;

    while let Some(job) = next.take() {
        match job {
            CommitJob::Partial(mut text) => {
                loop {
                    match receiver.try_recv() {
                        Ok(CommitJob::Partial(newer)) => text = newer,
                        Ok(other) => {
                            next = Some(other);
                            break;
                        }
                        Err(_) => break,
                    }
                }

                if !aborted.load(Ordering::SeqCst) {
                    match sink.persist_partial(&text).await {
                        Ok(()) => written += 1,
                        Err(error) => {
                            tracing::warn!(%error, chars = text.len(), "Partial commit failed");
                        }
                    }
                }
            }
            CommitJob::Final(text, reply) => {
                let result = sink.persist_final(&text).await;
                let _ = reply.send(result);
            }
        }

        if next.is_none() {
            next = receiver.recv().await;
        }
    }

    written
}

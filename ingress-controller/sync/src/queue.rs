//! Per-kind work queues.
//!
//! Each queue is drained by a single worker that handles one event at a
//! time. Events that fail are requeued after an exponential backoff until
//! the retry budget is spent.

use crate::metrics::QueueMetrics;
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender},
    time,
};
use tracing::{debug, error, warn};

#[async_trait]
pub trait Handle<E>: Send + Sync {
    async fn handle(&self, event: &E) -> anyhow::Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backoff {
    /// Number of times a failed event is requeued. Zero disables retries.
    pub max_retries: u32,
    pub initial: Duration,
    pub max: Duration,
}

#[derive(Debug)]
struct Queued<E> {
    event: E,
    /// Number of failed attempts so far.
    failures: u32,
}

pub struct Sender<E>(UnboundedSender<Queued<E>>);

pub struct Worker<E, H> {
    kind: &'static str,
    handler: Arc<H>,
    backoff: Backoff,
    metrics: QueueMetrics,
    rx: UnboundedReceiver<Queued<E>>,
    requeue: WeakUnboundedSender<Queued<E>>,
}

/// Creates a queue for events of `kind`.
///
/// The worker stops once every [`Sender`] has been dropped and the queue is
/// drained. Pending retries do not keep it alive.
pub fn channel<E, H>(
    kind: &'static str,
    handler: Arc<H>,
    backoff: Backoff,
    metrics: QueueMetrics,
) -> (Sender<E>, Worker<E, H>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let requeue = tx.downgrade();
    let worker = Worker {
        kind,
        handler,
        backoff,
        metrics,
        rx,
        requeue,
    };
    (Sender(tx), worker)
}

// === impl Backoff ===

impl Backoff {
    /// Delay before the attempt following the `failures`th failure.
    pub fn delay(&self, failures: u32) -> Duration {
        let factor = 1u32
            .checked_shl(failures.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }

    pub fn should_retry(&self, failures: u32) -> bool {
        failures <= self.max_retries
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
        }
    }
}

// === impl Sender ===

impl<E> Sender<E> {
    /// Enqueues an event. Returns false if the worker has stopped.
    pub fn send(&self, event: E) -> bool {
        self.0.send(Queued { event, failures: 0 }).is_ok()
    }
}

impl<E> Clone for Sender<E> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

// === impl Worker ===

impl<E, H> Worker<E, H>
where
    E: std::fmt::Debug + Send + Sync + 'static,
    H: Handle<E>,
{
    pub async fn run(mut self) {
        while let Some(Queued { event, failures }) = self.rx.recv().await {
            let error = match self.handler.handle(&event).await {
                Ok(()) => {
                    debug!(kind = self.kind, ?event, "Handled event");
                    continue;
                }
                Err(error) => error,
            };

            let failures = failures + 1;
            if !self.backoff.should_retry(failures) {
                error!(kind = self.kind, ?event, failures, %error, "Giving up on event");
                self.metrics.dropped(self.kind);
                continue;
            }

            let delay = self.backoff.delay(failures);
            warn!(kind = self.kind, failures, ?delay, %error, "Failed to handle event; retrying");
            self.metrics.retried(self.kind);

            let requeue = self.requeue.clone();
            tokio::spawn(async move {
                time::sleep(delay).await;
                if let Some(tx) = requeue.upgrade() {
                    let _ = tx.send(Queued { event, failures });
                }
            });
        }
        debug!(kind = self.kind, "Queue closed");
    }
}

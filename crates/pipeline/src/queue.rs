//! Fire-and-forget job submission.
//!
//! Intake hands each validated request to a [`TryOnQueue`] and answers the
//! HTTP caller straight away. A single [`TryOnWorker`] pulls jobs off the
//! channel and runs every one as a detached unit on a [`TaskTracker`]; the
//! only thing a unit reports back is its notification.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use drapely_core::types::TryOnRequest;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;
use uuid::Uuid;

use crate::pipeline::TryOnPipeline;

/// Default upper bound on waiting for in-flight units at shutdown.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Too many accepted jobs are waiting for the worker.
    #[error("Try-on queue is full")]
    Full,

    /// The worker has stopped.
    #[error("Try-on queue is closed")]
    Closed,
}

/// One accepted request waiting for the worker.
#[derive(Debug, Clone)]
pub struct TryOnJob {
    pub request_id: Uuid,
    pub request: TryOnRequest,
    pub accepted_at: DateTime<Utc>,
}

pub type JobReceiver = mpsc::Receiver<TryOnJob>;

/// Create a bounded queue. A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (TryOnQueue, JobReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (TryOnQueue { sender }, receiver)
}

// ---------------------------------------------------------------------------
// TryOnQueue
// ---------------------------------------------------------------------------

/// Submission side of the job queue. Cheap to clone.
#[derive(Clone)]
pub struct TryOnQueue {
    sender: mpsc::Sender<TryOnJob>,
}

impl TryOnQueue {
    /// Enqueue `request` without waiting and return its request id.
    pub fn submit(&self, request: TryOnRequest) -> Result<Uuid, QueueError> {
        let job = TryOnJob {
            request_id: Uuid::new_v4(),
            request,
            accepted_at: Utc::now(),
        };
        let request_id = job.request_id;

        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;

        tracing::debug!(%request_id, "Try-on job queued");
        Ok(request_id)
    }
}

// ---------------------------------------------------------------------------
// TryOnWorker
// ---------------------------------------------------------------------------

pub struct TryOnWorker {
    pipeline: Arc<TryOnPipeline>,
    tracker: TaskTracker,
    drain_timeout: Duration,
}

impl TryOnWorker {
    pub fn new(pipeline: Arc<TryOnPipeline>) -> Self {
        Self {
            pipeline,
            tracker: TaskTracker::new(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Run jobs until the channel closes or `cancel` fires, then wait for
    /// in-flight units (bounded by the drain timeout).
    ///
    /// Jobs already accepted into the channel when `cancel` fires are still
    /// started; nothing new can be submitted after that point.
    pub async fn run(self, mut receiver: JobReceiver, cancel: CancellationToken) {
        tracing::info!("Try-on worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Try-on worker shutting down");
                    break;
                }
                job = receiver.recv() => match job {
                    Some(job) => self.spawn(job),
                    None => {
                        tracing::info!("Try-on queue closed");
                        break;
                    }
                },
            }
        }

        receiver.close();
        while let Ok(job) = receiver.try_recv() {
            self.spawn(job);
        }

        self.tracker.close();
        let in_flight = self.tracker.len();
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for in-flight try-on requests");
        }
        if tokio::time::timeout(self.drain_timeout, self.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                in_flight = self.tracker.len(),
                timeout_secs = self.drain_timeout.as_secs(),
                "Drain timeout elapsed with try-on requests still running"
            );
        }

        tracing::info!("Try-on worker stopped");
    }

    fn spawn(&self, job: TryOnJob) {
        let span = tracing::info_span!(
            "tryon",
            request_id = %job.request_id,
            owner_id = %job.request.owner_id,
            tier = %job.request.tier,
        );
        let pipeline = Arc::clone(&self.pipeline);

        self.tracker.spawn(
            async move {
                let waited_ms = (Utc::now() - job.accepted_at).num_milliseconds();
                tracing::debug!(waited_ms, "Try-on job started");
                pipeline.run(job.request_id, &job.request).await;
            }
            .instrument(span),
        );
    }
}

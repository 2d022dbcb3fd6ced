//! In-process job queue for the fetch task.
//!
//! The scheduler pushes fresh ticks; workers drain the queue and run one
//! attempt per job. A retry is not slept on by the worker: a timer task
//! re-enqueues the job once its backoff has elapsed, so workers stay free in
//! the meantime.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use pricefeed_core::fetch::{FetchTask, TickOutcome};

/// One delivery of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchJob {
    pub attempt: u32,
}

impl FetchJob {
    pub fn fresh() -> Self {
        Self { attempt: 0 }
    }
}

/// Producer handle. The queue closes once every handle is dropped.
#[derive(Clone)]
pub struct FetchQueue {
    tx: mpsc::UnboundedSender<FetchJob>,
}

pub type FetchReceiver = mpsc::UnboundedReceiver<FetchJob>;

impl FetchQueue {
    pub fn channel() -> (Self, FetchReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns false when the queue is closed.
    pub fn enqueue(&self, job: FetchJob) -> bool {
        self.tx.send(job).is_ok()
    }
}

/// Spawns `workers` tasks draining `rx`.
///
/// Workers hold only a weak sender for retries, so they exit once the
/// producers are gone and the queue is empty. Retries still waiting on their
/// timer at that point are dropped.
pub fn spawn_workers(
    queue: &FetchQueue,
    rx: FetchReceiver,
    task: Arc<FetchTask>,
    workers: usize,
) -> Vec<JoinHandle<()>> {
    let rx = Arc::new(Mutex::new(rx));
    (0..workers.max(1))
        .map(|worker_id| {
            let rx = rx.clone();
            let retry_tx = queue.tx.downgrade();
            let task = task.clone();
            tokio::spawn(async move {
                info!("Fetch worker {} started", worker_id);
                loop {
                    let job = { rx.lock().await.recv().await };
                    let Some(job) = job else {
                        break;
                    };
                    if let Some(retry) = process_job(&task, job).await {
                        schedule_retry(retry_tx.clone(), retry);
                    }
                }
                info!("Fetch worker {} shutting down", worker_id);
            })
        })
        .collect()
}

/// A job to re-deliver after `delay`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Retry {
    pub job: FetchJob,
    pub delay: Duration,
}

/// Runs one attempt and logs its outcome. Returns the retry to schedule, if
/// any.
pub async fn process_job(task: &FetchTask, job: FetchJob) -> Option<Retry> {
    match task.run(job.attempt).await {
        Ok(TickOutcome::Committed {
            inserted,
            skipped,
            failed,
        }) => {
            info!(
                "Price fetch committed: {} inserted, {} skipped, {} failed",
                inserted, skipped, failed
            );
            None
        }
        Ok(TickOutcome::Abandoned { reason }) => {
            warn!("Price fetch abandoned: {}", reason);
            None
        }
        Ok(TickOutcome::RetryScheduled {
            next_attempt,
            delay,
        }) => Some(Retry {
            job: FetchJob {
                attempt: next_attempt,
            },
            delay,
        }),
        Err(e) => {
            error!("Price fetch failed: {}", e);
            None
        }
    }
}

fn schedule_retry(tx: mpsc::WeakUnboundedSender<FetchJob>, retry: Retry) {
    tokio::spawn(async move {
        tokio::time::sleep(retry.delay).await;
        match tx.upgrade() {
            Some(tx) => {
                if tx.send(retry.job).is_err() {
                    warn!("Fetch queue closed, dropping retry {}", retry.job.attempt);
                }
            }
            None => warn!("Fetch queue closed, dropping retry {}", retry.job.attempt),
        }
    });
}

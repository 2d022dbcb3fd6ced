//! Background scheduler for periodic price fetches.

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::task_queue::{FetchJob, FetchQueue};

/// Enqueues a fresh tick every `period`; the first tick is immediate.
///
/// Ticks are enqueued regardless of pending retries, so a slow tick may
/// overlap with the next one.
pub fn start_fetch_scheduler(queue: FetchQueue, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Price fetch scheduler started ({}s interval)", period.as_secs());

        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticks.tick().await;
            if !queue.enqueue(FetchJob::fresh()) {
                info!("Fetch queue closed, stopping scheduler");
                return;
            }
            debug!("Enqueued scheduled price fetch");
        }
    })
}

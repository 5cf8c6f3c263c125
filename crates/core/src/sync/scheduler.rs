//! Background sync triggers.
//!
//! Two trigger kinds drive the engine: a periodic interval (keep-existing:
//! ticks never stack behind a running cycle) and an on-demand immediate
//! trigger (last-request-wins: requests arriving while a cycle runs
//! coalesce into a single follow-up cycle). A failed cycle retries with
//! capped exponential backoff before giving up until the next trigger.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use rand::Rng;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use crate::errors::Result;

/// Periodic sync cadence.
pub const SYNC_PERIODIC_INTERVAL_SECS: u64 = 15 * 60;

/// Maximum jitter (seconds) added before the first periodic cycle.
pub const SYNC_START_JITTER_SECS: u64 = 5;

/// Attempts per trigger before giving up until the next trigger.
pub const SYNC_MAX_ATTEMPTS: u32 = 3;

const RETRY_BASE_BACKOFF_MS: u64 = 5_000;
const RETRY_MAX_BACKOFF_MS: u64 = 60_000;

/// One bound unit of sync work, already scoped to the signed-in owner.
#[async_trait]
pub trait SyncRunner: Send + Sync {
    async fn run_sync(&self) -> Result<()>;
}

/// Exponential backoff with jitter for 1-based `attempt`.
fn backoff_with_jitter(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(8);
    let backoff = (RETRY_BASE_BACKOFF_MS.saturating_mul(1 << exp)).min(RETRY_MAX_BACKOFF_MS);
    let jitter = rand::thread_rng().gen_range(0..=(backoff / 5).max(1));
    Duration::from_millis(backoff.saturating_add(jitter))
}

/// Handle to the background sync task.
pub struct SyncScheduler {
    immediate: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    /// Spawn the background task. Callers gate triggering on connectivity;
    /// the scheduler itself only sequences work.
    pub fn start(runner: Arc<dyn SyncRunner>) -> Self {
        let immediate = Arc::new(Notify::new());
        let trigger = Arc::clone(&immediate);
        let handle = tokio::spawn(async move {
            run_loop(runner, trigger).await;
        });
        Self { immediate, handle }
    }

    /// Request an immediate sync. Requests issued while a cycle is running
    /// replace any queued request rather than stacking.
    pub fn trigger_immediate(&self) {
        self.immediate.notify_one();
    }

    /// Stop the background task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_loop(runner: Arc<dyn SyncRunner>, trigger: Arc<Notify>) {
    let start_jitter = rand::thread_rng().gen_range(0..=SYNC_START_JITTER_SECS);
    let period = Duration::from_secs(SYNC_PERIODIC_INTERVAL_SECS);
    let mut ticker = interval_at(
        Instant::now() + period + Duration::from_secs(start_jitter),
        period,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                debug!("Periodic sync trigger");
            }
            _ = trigger.notified() => {
                debug!("Immediate sync trigger");
            }
        }
        run_cycle(runner.as_ref()).await;
    }
}

/// Run one sync cycle with capped retries.
async fn run_cycle(runner: &dyn SyncRunner) {
    for attempt in 1..=SYNC_MAX_ATTEMPTS {
        match runner.run_sync().await {
            Ok(()) => {
                debug!("Sync cycle completed (attempt {})", attempt);
                return;
            }
            Err(err) if attempt < SYNC_MAX_ATTEMPTS => {
                let backoff = backoff_with_jitter(attempt);
                warn!(
                    "Sync attempt {}/{} failed: {}; retrying in {:?}",
                    attempt, SYNC_MAX_ATTEMPTS, err, backoff
                );
                sleep(backoff).await;
            }
            Err(err) => {
                error!("Sync failed after {} attempts: {}", SYNC_MAX_ATTEMPTS, err);
            }
        }
    }
}

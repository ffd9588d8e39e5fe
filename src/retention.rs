// Retention sweep: delete series rows older than the horizon. Devices and rollups are exempt.
// Runs on its own slow cadence; optional VACUUM on a cron schedule (local time).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{Instrument, debug, info, warn};

use crate::error::StoreError;
use crate::history_repo::TelemetryStore;
use crate::models::{SeriesKind, now_ms};

#[derive(Debug)]
pub struct SweepReport {
    /// Rows with timestamp < cutoff_ms were eligible.
    pub cutoff_ms: i64,
    /// True when all tables were pruned in one transaction.
    pub atomic: bool,
    pub results: Vec<(SeriesKind, Result<u64, StoreError>)>,
}

impl SweepReport {
    pub fn deleted_total(&self) -> u64 {
        self.results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .sum()
    }

    pub fn failed_kinds(&self) -> Vec<SeriesKind> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(k, _)| *k)
            .collect()
    }
}

pub struct RetentionSweeper {
    store: Arc<dyn TelemetryStore>,
    horizon: Duration,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn TelemetryStore>, horizon: Duration) -> Self {
        Self { store, horizon }
    }

    pub fn cutoff(&self, now_ms: i64) -> i64 {
        now_ms - self.horizon.as_millis() as i64
    }

    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(now_ms()).await
    }

    /// One sweep relative to `now_ms`. Prefers the store's atomic cross-table prune; if the
    /// store lacks it or it fails, every table is still attempted on its own.
    pub async fn sweep_at(&self, now_ms: i64) -> SweepReport {
        let cutoff_ms = self.cutoff(now_ms);
        let report = match self.store.prune_all(cutoff_ms).await {
            Ok(pruned) => SweepReport {
                cutoff_ms,
                atomic: true,
                results: pruned.deleted.into_iter().map(|(k, n)| (k, Ok(n))).collect(),
            },
            Err(StoreError::Unsupported(what)) => {
                debug!(unsupported = what, "pruning tables independently");
                self.sweep_each(cutoff_ms).await
            }
            Err(e) => {
                warn!(error = %e, "atomic prune failed; pruning tables independently");
                self.sweep_each(cutoff_ms).await
            }
        };

        for (kind, result) in &report.results {
            match result {
                Ok(n) => debug!(kind = %kind, deleted = n, "retention sweep"),
                Err(e) => warn!(kind = %kind, error = %e, "retention sweep failed"),
            }
        }
        info!(
            cutoff_ms,
            deleted_total = report.deleted_total(),
            failed = report.failed_kinds().len(),
            "retention sweep complete"
        );
        report
    }

    async fn sweep_each(&self, cutoff_ms: i64) -> SweepReport {
        let results = join_all(SeriesKind::ALL.into_iter().map(|kind| async move {
            (kind, self.store.delete_older_than(kind, cutoff_ms).await)
        }))
        .await;
        SweepReport {
            cutoff_ms,
            atomic: false,
            results,
        }
    }

    async fn vacuum(&self) {
        match self.store.vacuum().await {
            Ok(()) => info!("vacuum complete"),
            Err(StoreError::Unsupported(_)) => debug!("store has no vacuum"),
            Err(e) => warn!(error = %e, "vacuum failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub sweep_interval: Duration,
    /// Optional cron expression for VACUUM (e.g. "0 0 3 * * *" = 03:00 daily).
    pub vacuum_schedule: Option<String>,
}

/// Spawns the sweep loop. The first sweep runs one interval after start; the interval must
/// be non-zero.
pub fn spawn(
    sweeper: Arc<RetentionSweeper>,
    config: SweeperConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let span = tracing::debug_span!(
        "retention",
        sweep_interval_ms = config.sweep_interval.as_millis() as u64
    );
    tokio::spawn(
        async move {
            let mut sweep_tick =
                interval_at(Instant::now() + config.sweep_interval, config.sweep_interval);
            sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let (vacuum_tx, mut vacuum_rx) = mpsc::channel::<()>(1);
            let vacuum_handle = config
                .vacuum_schedule
                .clone()
                .map(|schedule| tokio::spawn(vacuum_scheduler(schedule, vacuum_tx)));

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        debug!("Retention sweeper shutting down");
                        break;
                    }
                    _ = sweep_tick.tick() => {
                        sweeper.sweep().await;
                    }
                    Some(()) = vacuum_rx.recv() => {
                        sweeper.vacuum().await;
                    }
                }
            }
            if let Some(handle) = vacuum_handle {
                handle.abort();
            }
        }
        .instrument(span),
    )
}

/// Sends on `tx` at each VACUUM time of the cron schedule (local time).
async fn vacuum_scheduler(schedule: String, tx: mpsc::Sender<()>) {
    let Ok(schedule) = cron::Schedule::from_str(&schedule) else {
        warn!(cron = %schedule, "invalid vacuum_schedule; VACUUM will not run");
        return;
    };
    loop {
        let now = chrono::Local::now();
        if let Some(next) = schedule.after(&now).next() {
            let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
            tokio::time::sleep(delay).await;
            if tx.send(()).await.is_err() {
                break;
            }
        } else {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}

// Fast collection loop. The first tick fires immediately; each cycle is awaited inside the
// loop, so a slow cycle delays the next tick (missed ticks are skipped) instead of overlapping it.

use crate::collector::Collector;
use crate::models::MetricKind;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at};
use tracing::Instrument;

/// Collection timing and logging config.
pub struct WorkerConfig {
    pub tick_interval: Duration,
    /// How often to log collector stats (real time).
    pub stats_log_interval: Duration,
}

/// Both periods must be non-zero.
pub fn spawn(
    collector: Arc<Collector>,
    config: WorkerConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let WorkerConfig {
        tick_interval,
        stats_log_interval,
    } = config;
    let span = tracing::debug_span!(
        "collector",
        tick_interval_ms = tick_interval.as_millis() as u64
    );

    tokio::spawn(
        async move {
            let mut tick = interval(tick_interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut stats_log_tick =
                interval_at(Instant::now() + stats_log_interval, stats_log_interval);
            stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Collector worker shutting down");
                        break;
                    }
                    _ = tick.tick() => {
                        collector.run_cycle().await;
                    }
                    _ = stats_log_tick.tick() => {
                        let stats = collector.stats();
                        tracing::info!(
                            cycles_total = stats.cycles(),
                            throughput_failures = stats.failures(MetricKind::Throughput),
                            devices_failures = stats.failures(MetricKind::Devices),
                            latency_failures = stats.failures(MetricKind::Latency),
                            health_failures = stats.failures(MetricKind::Health),
                            quality_failures = stats.failures(MetricKind::Quality),
                            "collector stats"
                        );
                    }
                }
            }
        }
        .instrument(span),
    )
}

// One collection cycle: fetch all five kinds concurrently, persist each independently.
// A kind's failure (fetch, timeout, write) is logged and recorded; siblings are unaffected
// and nothing propagates out of the cycle.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::aggregator;
use crate::error::{CollectError, SourceError};
use crate::history_repo::TelemetryStore;
use crate::models::{
    DeviceRecord, HealthSample, LatencySample, MetricKind, QualitySample, ThroughputSample,
};
use crate::source::MetricsSource;

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Bound on each source fetch.
    pub fetch_timeout: Duration,
    pub latency_targets: Vec<String>,
}

/// Result of one kind's branch: rows written, or why none were.
pub type KindOutcome = Result<usize, CollectError>;

#[derive(Debug)]
pub struct CycleReport {
    pub timestamp: i64,
    pub outcomes: Vec<(MetricKind, KindOutcome)>,
}

impl CycleReport {
    pub fn outcome(&self, kind: MetricKind) -> Option<&KindOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, o)| o)
    }

    pub fn succeeded(&self, kind: MetricKind) -> bool {
        matches!(self.outcome(kind), Some(Ok(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &CollectError> {
        self.outcomes.iter().filter_map(|(_, o)| o.as_ref().err())
    }
}

/// Counters since the collector was built. Read by the worker's periodic stats log.
#[derive(Debug, Default)]
pub struct CollectorStats {
    cycles: AtomicU64,
    failures: [AtomicU64; 5],
}

impl CollectorStats {
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn failures(&self, kind: MetricKind) -> u64 {
        self.failures[kind_index(kind)].load(Ordering::Relaxed)
    }

    fn record(&self, report: &CycleReport) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        for err in report.failures() {
            self.failures[kind_index(err.kind())].fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn kind_index(kind: MetricKind) -> usize {
    match kind {
        MetricKind::Throughput => 0,
        MetricKind::Devices => 1,
        MetricKind::Latency => 2,
        MetricKind::Health => 3,
        MetricKind::Quality => 4,
    }
}

pub struct Collector {
    source: Arc<dyn MetricsSource>,
    store: Arc<dyn TelemetryStore>,
    config: CollectorConfig,
    stats: CollectorStats,
}

impl Collector {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        store: Arc<dyn TelemetryStore>,
        config: CollectorConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
            stats: CollectorStats::default(),
        }
    }

    pub fn stats(&self) -> &CollectorStats {
        &self.stats
    }

    /// Runs all five branches to completion (join-all, never fail-fast) and reports each.
    pub async fn run_cycle(&self) -> CycleReport {
        let now = Utc::now();
        let timestamp = now.timestamp_millis();

        let (throughput, devices, latency, health, quality) = tokio::join!(
            self.collect_throughput(now),
            self.collect_devices(timestamp),
            self.collect_latency(timestamp),
            self.collect_health(timestamp),
            self.collect_quality(timestamp),
        );

        let report = CycleReport {
            timestamp,
            outcomes: vec![
                (MetricKind::Throughput, throughput),
                (MetricKind::Devices, devices),
                (MetricKind::Latency, latency),
                (MetricKind::Health, health),
                (MetricKind::Quality, quality),
            ],
        };

        for (kind, outcome) in &report.outcomes {
            match outcome {
                Ok(rows) => debug!(kind = %kind, rows, "collected"),
                Err(e @ CollectError::StoreUnavailable { .. }) => {
                    warn!(kind = %kind, error = %e, "store unavailable; sample dropped")
                }
                Err(e) => warn!(kind = %kind, error = %e, "collection failed"),
            }
        }
        self.stats.record(&report);
        report
    }

    /// Awaits `fetch` under the configured timeout, tagging failures with `kind`.
    async fn fetch<T>(
        &self,
        kind: MetricKind,
        fetch: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, CollectError> {
        match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(source)) => Err(CollectError::Source { kind, source }),
            Err(_) => Err(CollectError::Source {
                kind,
                source: SourceError::Timeout(self.config.fetch_timeout),
            }),
        }
    }

    /// Throughput row plus the daily/monthly rollups derived from it. No fetch, no rollup.
    async fn collect_throughput(&self, now: DateTime<Utc>) -> KindOutcome {
        let kind = MetricKind::Throughput;
        let reading = self.fetch(kind, self.source.throughput()).await?;
        let sample = ThroughputSample::from_reading(now.timestamp_millis(), &reading);

        let appended = self.store.append_throughput(&sample).await;
        let rolled = aggregator::update_rollups(self.store.as_ref(), &sample, now).await;
        match (appended, rolled) {
            (Ok(()), Ok(())) => Ok(1),
            (Err(e), rolled) => {
                if let Err(re) = rolled {
                    debug!(error = %re, "rollup update failed alongside throughput write");
                }
                Err(CollectError::from_store(kind, e))
            }
            (Ok(()), Err(e)) => Err(CollectError::from_store(kind, e)),
        }
    }

    /// Upserts every visible device as online. Devices missing from the snapshot are left as-is.
    async fn collect_devices(&self, timestamp: i64) -> KindOutcome {
        let kind = MetricKind::Devices;
        let readings = self.fetch(kind, self.source.devices()).await?;
        let records: Vec<DeviceRecord> = readings
            .iter()
            .filter(|r| !r.mac_address.trim().is_empty())
            .map(|r| DeviceRecord::from_reading(timestamp, r))
            .collect();
        self.store
            .upsert_devices(&records)
            .await
            .map_err(|e| CollectError::from_store(kind, e))?;
        Ok(records.len())
    }

    async fn collect_latency(&self, timestamp: i64) -> KindOutcome {
        let kind = MetricKind::Latency;
        let readings = self
            .fetch(kind, self.source.latency(&self.config.latency_targets))
            .await?;
        let samples: Vec<LatencySample> = readings
            .iter()
            .map(|r| LatencySample::from_reading(timestamp, r))
            .collect();
        self.store
            .append_latency(&samples)
            .await
            .map_err(|e| CollectError::from_store(kind, e))?;
        Ok(samples.len())
    }

    async fn collect_health(&self, timestamp: i64) -> KindOutcome {
        let kind = MetricKind::Health;
        let reading = self.fetch(kind, self.source.health()).await?;
        self.store
            .append_health(&HealthSample::from_reading(timestamp, &reading))
            .await
            .map_err(|e| CollectError::from_store(kind, e))?;
        Ok(1)
    }

    async fn collect_quality(&self, timestamp: i64) -> KindOutcome {
        let kind = MetricKind::Quality;
        let reading = self.fetch(kind, self.source.quality()).await?;
        self.store
            .append_quality(&QualitySample::from_reading(timestamp, &reading))
            .await
            .map_err(|e| CollectError::from_store(kind, e))?;
        Ok(1)
    }
}

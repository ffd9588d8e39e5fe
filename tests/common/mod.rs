// Shared test helpers: a scriptable metrics source, a fault-injecting store, repo setup

#![allow(dead_code)]

use async_trait::async_trait;
use routerwatch::error::{SourceError, StoreError};
use routerwatch::history_repo::{HistoryRepo, PruneReport, TelemetryStore};
use routerwatch::models::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub async fn open_repo(dir: &TempDir) -> Arc<HistoryRepo> {
    let path = dir.path().join("telemetry.db");
    let repo = HistoryRepo::connect(path.to_str().unwrap(), 3)
        .await
        .unwrap();
    repo.init().await.unwrap();
    Arc::new(repo)
}

pub fn traffic(upload_rate: f64, download_rate: f64, up_bytes: u64, down_bytes: u64) -> TrafficReading {
    TrafficReading {
        upload_rate_kbps: upload_rate,
        download_rate_kbps: download_rate,
        cumulative_upload_bytes: up_bytes,
        cumulative_download_bytes: down_bytes,
    }
}

pub fn device(mac: &str, ip: &str, hostname: Option<&str>) -> DeviceReading {
    DeviceReading {
        mac_address: mac.into(),
        ip_address: ip.into(),
        hostname: hostname.map(String::from),
        device_type: None,
        upload_rate_kbps: 1.0,
        download_rate_kbps: 2.0,
    }
}

pub fn throughput_sample(timestamp: i64) -> ThroughputSample {
    ThroughputSample::from_reading(timestamp, &traffic(10.0, 20.0, 1_000, 2_000))
}

pub fn latency_sample(timestamp: i64, target: &str) -> LatencySample {
    LatencySample {
        timestamp,
        target: target.into(),
        latency_ms: 12.5,
        packet_loss_pct: 0.0,
        jitter_ms: 1.5,
    }
}

pub fn health_sample(timestamp: i64) -> HealthSample {
    HealthSample::from_reading(timestamp, &health_reading())
}

pub fn quality_sample(timestamp: i64) -> QualitySample {
    QualitySample::from_reading(timestamp, &quality_reading())
}

pub fn health_reading() -> HealthReading {
    HealthReading {
        cpu_pct: 25.0,
        mem_pct: 50.0,
        mem_total_bytes: 1024,
        mem_used_bytes: 512,
        temperature_c: 48.0,
        uptime_secs: 3600,
        load_average: 0.5,
    }
}

pub fn quality_reading() -> QualityReading {
    QualityReading {
        signal_strength_pct: 90.0,
        stability_pct: 98.0,
        error_rate_pct: 1.0,
        retransmit_rate_pct: 1.0,
    }
}

/// Source with fixed readings. Individual kinds can be made to fail or stall.
#[derive(Default)]
pub struct StubSource {
    failing: Mutex<HashSet<MetricKind>>,
    delays: Mutex<HashMap<MetricKind, Duration>>,
    traffic: Mutex<Option<TrafficReading>>,
    devices: Mutex<Vec<DeviceReading>>,
    pub throughput_calls: AtomicU64,
}

impl StubSource {
    pub fn new() -> Self {
        let stub = Self::default();
        stub.set_traffic(traffic(100.0, 200.0, 10_000, 20_000));
        stub.set_devices(vec![
            device("AA:BB:CC:00:00:01", "192.168.1.10", Some("laptop")),
            device("aa:bb:cc:00:00:02", "192.168.1.11", None),
        ]);
        stub
    }

    pub fn fail(&self, kind: MetricKind) {
        self.failing.lock().unwrap().insert(kind);
    }

    pub fn delay(&self, kind: MetricKind, by: Duration) {
        self.delays.lock().unwrap().insert(kind, by);
    }

    pub fn set_traffic(&self, reading: TrafficReading) {
        *self.traffic.lock().unwrap() = Some(reading);
    }

    pub fn set_devices(&self, devices: Vec<DeviceReading>) {
        *self.devices.lock().unwrap() = devices;
    }

    async fn gate(&self, kind: MetricKind) -> Result<(), SourceError> {
        let delay = self.delays.lock().unwrap().get(&kind).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&kind) {
            return Err(SourceError::Unavailable(format!("{} stubbed to fail", kind)));
        }
        Ok(())
    }
}

#[async_trait]
impl routerwatch::source::MetricsSource for StubSource {
    async fn throughput(&self) -> Result<TrafficReading, SourceError> {
        self.throughput_calls.fetch_add(1, Ordering::SeqCst);
        self.gate(MetricKind::Throughput).await?;
        self.traffic
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SourceError::Unavailable("no traffic".into()))
    }

    async fn devices(&self) -> Result<Vec<DeviceReading>, SourceError> {
        self.gate(MetricKind::Devices).await?;
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn latency(&self, targets: &[String]) -> Result<Vec<LatencyReading>, SourceError> {
        self.gate(MetricKind::Latency).await?;
        Ok(targets
            .iter()
            .map(|t| LatencyReading {
                target: t.clone(),
                latency_ms: 10.0,
                packet_loss_pct: 0.0,
                jitter_ms: 1.0,
            })
            .collect())
    }

    async fn health(&self) -> Result<HealthReading, SourceError> {
        self.gate(MetricKind::Health).await?;
        Ok(health_reading())
    }

    async fn quality(&self) -> Result<QualityReading, SourceError> {
        self.gate(MetricKind::Quality).await?;
        Ok(quality_reading())
    }
}

fn injected() -> StoreError {
    StoreError::Sqlx(sqlx::Error::Protocol("injected failure".into()))
}

/// Delegates to a real repo, failing the selected operations.
pub struct FailingStore {
    pub inner: Arc<HistoryRepo>,
    pub fail_writes: HashSet<MetricKind>,
    pub fail_rollups: bool,
    pub fail_deletes: HashSet<SeriesKind>,
    pub fail_prune_all: bool,
}

impl FailingStore {
    pub fn new(inner: Arc<HistoryRepo>) -> Self {
        Self {
            inner,
            fail_writes: HashSet::new(),
            fail_rollups: false,
            fail_deletes: HashSet::new(),
            fail_prune_all: false,
        }
    }

    fn check(&self, kind: MetricKind) -> Result<(), StoreError> {
        if self.fail_writes.contains(&kind) {
            Err(injected())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TelemetryStore for FailingStore {
    async fn append_throughput(&self, sample: &ThroughputSample) -> Result<(), StoreError> {
        self.check(MetricKind::Throughput)?;
        self.inner.append_throughput(sample).await
    }

    async fn append_latency(&self, samples: &[LatencySample]) -> Result<(), StoreError> {
        self.check(MetricKind::Latency)?;
        self.inner.append_latency(samples).await
    }

    async fn append_health(&self, sample: &HealthSample) -> Result<(), StoreError> {
        self.check(MetricKind::Health)?;
        self.inner.append_health(sample).await
    }

    async fn append_quality(&self, sample: &QualitySample) -> Result<(), StoreError> {
        self.check(MetricKind::Quality)?;
        self.inner.append_quality(sample).await
    }

    async fn upsert_devices(&self, devices: &[DeviceRecord]) -> Result<(), StoreError> {
        self.check(MetricKind::Devices)?;
        self.inner.upsert_devices(devices).await
    }

    async fn upsert_rollup(
        &self,
        period_key: &str,
        period_type: PeriodType,
        totals: &RollupTotals,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        if self.fail_rollups {
            return Err(injected());
        }
        self.inner
            .upsert_rollup(period_key, period_type, totals, now_ms)
            .await
    }

    async fn delete_older_than(
        &self,
        kind: SeriesKind,
        cutoff_ms: i64,
    ) -> Result<u64, StoreError> {
        if self.fail_deletes.contains(&kind) {
            return Err(injected());
        }
        self.inner.delete_older_than(kind, cutoff_ms).await
    }

    async fn prune_all(&self, cutoff_ms: i64) -> Result<PruneReport, StoreError> {
        if self.fail_prune_all {
            return Err(injected());
        }
        self.inner.prune_all(cutoff_ms).await
    }
}

/// Writes one row of every series kind at `timestamp`.
pub async fn seed_series(repo: &HistoryRepo, timestamp: i64) {
    repo.append_throughput(&throughput_sample(timestamp))
        .await
        .unwrap();
    repo.append_latency(&[latency_sample(timestamp, "8.8.8.8:53")])
        .await
        .unwrap();
    repo.append_health(&health_sample(timestamp)).await.unwrap();
    repo.append_quality(&quality_sample(timestamp)).await.unwrap();
}

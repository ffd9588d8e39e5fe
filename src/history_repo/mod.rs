// SQLite telemetry history. One table per series kind, plus devices (keyed by MAC)
// and bandwidth rollups (keyed by period). Timestamps are epoch milliseconds.

mod query;
mod schema;
mod unavailable;

pub use unavailable::UnavailableStore;

use crate::error::StoreError;
use crate::models::{
    DeviceRecord, HealthSample, LatencySample, PeriodType, QualitySample, RollupTotals,
    SeriesKind, ThroughputSample, now_ms,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// Rows removed per series by one prune.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub deleted: Vec<(SeriesKind, u64)>,
}

impl PruneReport {
    pub fn total(&self) -> u64 {
        self.deleted.iter().map(|(_, n)| n).sum()
    }
}

/// Write side used by the collector, aggregator and retention sweeper.
/// Every failure comes back as a `StoreError`; callers decide how to log it.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    async fn append_throughput(&self, sample: &ThroughputSample) -> Result<(), StoreError>;

    /// One tick's latency rows (one per target).
    async fn append_latency(&self, samples: &[LatencySample]) -> Result<(), StoreError>;

    async fn append_health(&self, sample: &HealthSample) -> Result<(), StoreError>;

    async fn append_quality(&self, sample: &QualitySample) -> Result<(), StoreError>;

    /// Insert or overwrite each device by MAC address.
    async fn upsert_devices(&self, devices: &[DeviceRecord]) -> Result<(), StoreError>;

    /// Insert or overwrite the rollup row for (period_key, period_type).
    async fn upsert_rollup(
        &self,
        period_key: &str,
        period_type: PeriodType,
        totals: &RollupTotals,
        now_ms: i64,
    ) -> Result<(), StoreError>;

    /// Delete rows of `kind` with timestamp strictly before `cutoff_ms`.
    async fn delete_older_than(&self, kind: SeriesKind, cutoff_ms: i64)
    -> Result<u64, StoreError>;

    /// Delete from every series table in one all-or-nothing batch.
    async fn prune_all(&self, _cutoff_ms: i64) -> Result<PruneReport, StoreError> {
        Err(StoreError::Unsupported("atomic cross-table prune"))
    }

    /// Reclaim space after deletes.
    async fn vacuum(&self) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("vacuum"))
    }
}

pub struct HistoryRepo {
    pool: SqlitePool,
}

impl HistoryRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    /// Creates tables and indexes if missing. Safe to call repeatedly.
    pub async fn init(&self) -> anyhow::Result<()> {
        schema::create_tables(&self.pool).await
    }
}

#[async_trait]
impl TelemetryStore for HistoryRepo {
    #[instrument(skip(self, sample), fields(repo = "history", operation = "append_throughput"))]
    async fn append_throughput(&self, sample: &ThroughputSample) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO network_traffic (timestamp, upload_speed, download_speed, total_upload, total_download, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(sample.timestamp)
        .bind(sample.upload_rate_kbps)
        .bind(sample.download_rate_kbps)
        .bind(sample.cumulative_upload_bytes as i64)
        .bind(sample.cumulative_download_bytes as i64)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, samples), fields(repo = "history", operation = "append_latency", samples_count = samples.len()))]
    async fn append_latency(&self, samples: &[LatencySample]) -> Result<(), StoreError> {
        if samples.is_empty() {
            return Ok(());
        }
        let created_at = now_ms();
        let mut tx = self.pool.begin().await?;
        for s in samples {
            sqlx::query(
                "INSERT INTO network_latency (timestamp, target, latency, packet_loss, jitter, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(s.timestamp)
            .bind(&s.target)
            .bind(s.latency_ms)
            .bind(s.packet_loss_pct)
            .bind(s.jitter_ms)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, sample), fields(repo = "history", operation = "append_health"))]
    async fn append_health(&self, sample: &HealthSample) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO router_status
            (timestamp, cpu_usage, memory_usage, memory_total, memory_used,
             temperature, uptime, load_average, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(sample.timestamp)
        .bind(sample.cpu_pct)
        .bind(sample.mem_pct)
        .bind(sample.mem_total_bytes as i64)
        .bind(sample.mem_used_bytes as i64)
        .bind(sample.temperature_c)
        .bind(sample.uptime_secs as i64)
        .bind(sample.load_average)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, sample), fields(repo = "history", operation = "append_quality"))]
    async fn append_quality(&self, sample: &QualitySample) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO connection_quality
            (timestamp, signal_strength, connection_stability, error_rate, retransmission_rate, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(sample.timestamp)
        .bind(sample.signal_strength_pct)
        .bind(sample.stability_pct)
        .bind(sample.error_rate_pct)
        .bind(sample.retransmit_rate_pct)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, devices), fields(repo = "history", operation = "upsert_devices", devices_count = devices.len()))]
    async fn upsert_devices(&self, devices: &[DeviceRecord]) -> Result<(), StoreError> {
        if devices.is_empty() {
            return Ok(());
        }
        let now = now_ms();
        let mut tx = self.pool.begin().await?;
        for d in devices {
            // Absent hostname/device_type keep whatever was stored before.
            sqlx::query(
                r#"
                INSERT INTO online_devices
                (mac_address, ip_address, hostname, device_type, is_online, last_seen,
                 upload_speed, download_speed, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
                ON CONFLICT(mac_address) DO UPDATE SET
                    ip_address = excluded.ip_address,
                    hostname = COALESCE(excluded.hostname, online_devices.hostname),
                    device_type = COALESCE(excluded.device_type, online_devices.device_type),
                    is_online = excluded.is_online,
                    last_seen = excluded.last_seen,
                    upload_speed = excluded.upload_speed,
                    download_speed = excluded.download_speed,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&d.mac_address)
            .bind(&d.ip_address)
            .bind(d.hostname.as_deref())
            .bind(d.device_type.as_deref())
            .bind(d.is_online)
            .bind(d.last_seen)
            .bind(d.upload_rate_kbps)
            .bind(d.download_rate_kbps)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, totals), fields(repo = "history", operation = "upsert_rollup", period_type = %period_type))]
    async fn upsert_rollup(
        &self,
        period_key: &str,
        period_type: PeriodType,
        totals: &RollupTotals,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO bandwidth_usage
            (date, period_type, total_upload, total_download,
             peak_upload_speed, peak_download_speed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ON CONFLICT(date, period_type) DO UPDATE SET
                total_upload = excluded.total_upload,
                total_download = excluded.total_download,
                peak_upload_speed = excluded.peak_upload_speed,
                peak_download_speed = excluded.peak_download_speed,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(period_key)
        .bind(period_type.as_str())
        .bind(totals.cumulative_upload as i64)
        .bind(totals.cumulative_download as i64)
        .bind(totals.peak_upload_rate)
        .bind(totals.peak_download_rate)
        .bind(now_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "history", operation = "delete_older_than"))]
    async fn delete_older_than(
        &self,
        kind: SeriesKind,
        cutoff_ms: i64,
    ) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {} WHERE timestamp < $1", kind.table());
        let r = sqlx::query(&sql).bind(cutoff_ms).execute(&self.pool).await?;
        Ok(r.rows_affected())
    }

    #[instrument(skip(self), fields(repo = "history", operation = "prune_all"))]
    async fn prune_all(&self, cutoff_ms: i64) -> Result<PruneReport, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut report = PruneReport::default();
        for kind in SeriesKind::ALL {
            let sql = format!("DELETE FROM {} WHERE timestamp < $1", kind.table());
            let r = sqlx::query(&sql).bind(cutoff_ms).execute(&mut *tx).await?;
            report.deleted.push((kind, r.rows_affected()));
        }
        tx.commit().await?;
        Ok(report)
    }

    #[instrument(skip(self), fields(repo = "history", operation = "vacuum"))]
    async fn vacuum(&self) -> Result<(), StoreError> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}

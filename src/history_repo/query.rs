// Read path: latest/recent projections of what the collector wrote.
// Recent queries are newest-first and capped, like the dashboard's views.

use super::HistoryRepo;
use crate::models::{
    BandwidthRollup, DeviceRecord, HealthSample, LatencySample, PeriodType, QualitySample,
    SeriesKind, ThroughputSample,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::instrument;

/// Row cap for `recent_*` queries.
pub const RECENT_LIMIT: i64 = 1000;

const TRAFFIC_COLUMNS: &str =
    "timestamp, upload_speed, download_speed, total_upload, total_download";
const LATENCY_COLUMNS: &str = "timestamp, target, latency, packet_loss, jitter";
const STATUS_COLUMNS: &str = "timestamp, cpu_usage, memory_usage, memory_total, memory_used, temperature, uptime, load_average";
const QUALITY_COLUMNS: &str =
    "timestamp, signal_strength, connection_stability, error_rate, retransmission_rate";
const DEVICE_COLUMNS: &str = "mac_address, ip_address, hostname, device_type, is_online, last_seen, upload_speed, download_speed";

impl HistoryRepo {
    pub async fn latest_throughput(&self) -> anyhow::Result<Option<ThroughputSample>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM network_traffic ORDER BY timestamp DESC, id DESC LIMIT 1",
            TRAFFIC_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(parse_throughput_row).transpose()
    }

    /// Throughput rows with timestamp >= since_ms, newest first.
    #[instrument(skip(self), fields(repo = "history", operation = "recent_throughput"))]
    pub async fn recent_throughput(&self, since_ms: i64) -> anyhow::Result<Vec<ThroughputSample>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM network_traffic WHERE timestamp >= $1 ORDER BY timestamp DESC, id DESC LIMIT $2",
            TRAFFIC_COLUMNS
        ))
        .bind(since_ms)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_throughput_row).collect()
    }

    /// Most recent `limit` latency rows across all targets.
    pub async fn latest_latency(&self, limit: u32) -> anyhow::Result<Vec<LatencySample>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM network_latency ORDER BY timestamp DESC, id DESC LIMIT $1",
            LATENCY_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_latency_row).collect()
    }

    #[instrument(skip(self), fields(repo = "history", operation = "recent_latency"))]
    pub async fn recent_latency(&self, since_ms: i64) -> anyhow::Result<Vec<LatencySample>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM network_latency WHERE timestamp >= $1 ORDER BY timestamp DESC, id DESC LIMIT $2",
            LATENCY_COLUMNS
        ))
        .bind(since_ms)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_latency_row).collect()
    }

    pub async fn latest_health(&self) -> anyhow::Result<Option<HealthSample>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM router_status ORDER BY timestamp DESC, id DESC LIMIT 1",
            STATUS_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(parse_health_row).transpose()
    }

    #[instrument(skip(self), fields(repo = "history", operation = "recent_health"))]
    pub async fn recent_health(&self, since_ms: i64) -> anyhow::Result<Vec<HealthSample>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM router_status WHERE timestamp >= $1 ORDER BY timestamp DESC, id DESC LIMIT $2",
            STATUS_COLUMNS
        ))
        .bind(since_ms)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_health_row).collect()
    }

    pub async fn latest_quality(&self) -> anyhow::Result<Option<QualitySample>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM connection_quality ORDER BY timestamp DESC, id DESC LIMIT 1",
            QUALITY_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(parse_quality_row).transpose()
    }

    #[instrument(skip(self), fields(repo = "history", operation = "recent_quality"))]
    pub async fn recent_quality(&self, since_ms: i64) -> anyhow::Result<Vec<QualitySample>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM connection_quality WHERE timestamp >= $1 ORDER BY timestamp DESC, id DESC LIMIT $2",
            QUALITY_COLUMNS
        ))
        .bind(since_ms)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_quality_row).collect()
    }

    /// Devices ordered by last_seen, newest first. `online_only` filters on the online flag.
    pub async fn devices(&self, online_only: bool) -> anyhow::Result<Vec<DeviceRecord>> {
        let filter = if online_only { "WHERE is_online = 1" } else { "" };
        let rows = sqlx::query(&format!(
            "SELECT {} FROM online_devices {} ORDER BY last_seen DESC, id ASC",
            DEVICE_COLUMNS, filter
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_device_row).collect()
    }

    /// Rollups with period key >= since_key (`YYYY-MM-DD`), newest first.
    pub async fn bandwidth_usage(&self, since_key: &str) -> anyhow::Result<Vec<BandwidthRollup>> {
        let rows = sqlx::query(
            "SELECT date, period_type, total_upload, total_download, peak_upload_speed, peak_download_speed, created_at, updated_at
             FROM bandwidth_usage WHERE date >= $1 ORDER BY date DESC, period_type ASC",
        )
        .bind(since_key)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_rollup_row).collect()
    }

    pub async fn rollup(
        &self,
        period_key: &str,
        period_type: PeriodType,
    ) -> anyhow::Result<Option<BandwidthRollup>> {
        let row = sqlx::query(
            "SELECT date, period_type, total_upload, total_download, peak_upload_speed, peak_download_speed, created_at, updated_at
             FROM bandwidth_usage WHERE date = $1 AND period_type = $2",
        )
        .bind(period_key)
        .bind(period_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(parse_rollup_row).transpose()
    }

    pub async fn count_rows(&self, kind: SeriesKind) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", kind.table()))
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn count_devices(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM online_devices")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn count_rollups(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bandwidth_usage")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

fn parse_throughput_row(row: &SqliteRow) -> anyhow::Result<ThroughputSample> {
    Ok(ThroughputSample {
        timestamp: row.try_get("timestamp")?,
        upload_rate_kbps: row.try_get("upload_speed")?,
        download_rate_kbps: row.try_get("download_speed")?,
        cumulative_upload_bytes: row.try_get::<i64, _>("total_upload")? as u64,
        cumulative_download_bytes: row.try_get::<i64, _>("total_download")? as u64,
    })
}

fn parse_latency_row(row: &SqliteRow) -> anyhow::Result<LatencySample> {
    Ok(LatencySample {
        timestamp: row.try_get("timestamp")?,
        target: row.try_get("target")?,
        latency_ms: row.try_get("latency")?,
        packet_loss_pct: row.try_get("packet_loss")?,
        jitter_ms: row.try_get("jitter")?,
    })
}

fn parse_health_row(row: &SqliteRow) -> anyhow::Result<HealthSample> {
    Ok(HealthSample {
        timestamp: row.try_get("timestamp")?,
        cpu_pct: row.try_get("cpu_usage")?,
        mem_pct: row.try_get("memory_usage")?,
        mem_total_bytes: row.try_get::<i64, _>("memory_total")? as u64,
        mem_used_bytes: row.try_get::<i64, _>("memory_used")? as u64,
        temperature_c: row.try_get("temperature")?,
        uptime_secs: row.try_get::<i64, _>("uptime")? as u64,
        load_average: row.try_get("load_average")?,
    })
}

fn parse_quality_row(row: &SqliteRow) -> anyhow::Result<QualitySample> {
    Ok(QualitySample {
        timestamp: row.try_get("timestamp")?,
        signal_strength_pct: row.try_get("signal_strength")?,
        stability_pct: row.try_get("connection_stability")?,
        error_rate_pct: row.try_get("error_rate")?,
        retransmit_rate_pct: row.try_get("retransmission_rate")?,
    })
}

fn parse_device_row(row: &SqliteRow) -> anyhow::Result<DeviceRecord> {
    Ok(DeviceRecord {
        mac_address: row.try_get("mac_address")?,
        ip_address: row.try_get("ip_address")?,
        hostname: row.try_get("hostname")?,
        device_type: row.try_get("device_type")?,
        is_online: row.try_get("is_online")?,
        last_seen: row.try_get("last_seen")?,
        upload_rate_kbps: row.try_get("upload_speed")?,
        download_rate_kbps: row.try_get("download_speed")?,
    })
}

fn parse_rollup_row(row: &SqliteRow) -> anyhow::Result<BandwidthRollup> {
    let period_type: String = row.try_get("period_type")?;
    let period_type = PeriodType::parse(&period_type)
        .ok_or_else(|| anyhow::anyhow!("unknown period_type in bandwidth_usage: {}", period_type))?;
    Ok(BandwidthRollup {
        period_key: row.try_get("date")?,
        period_type,
        cumulative_upload: row.try_get::<i64, _>("total_upload")? as u64,
        cumulative_download: row.try_get::<i64, _>("total_download")? as u64,
        peak_upload_rate: row.try_get("peak_upload_speed")?,
        peak_download_rate: row.try_get("peak_download_speed")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

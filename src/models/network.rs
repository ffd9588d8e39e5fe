// Network traffic, latency and connection quality models

use serde::{Deserialize, Serialize};

/// Throughput as reported by the source: current rates and counters since router boot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficReading {
    pub upload_rate_kbps: f64,
    pub download_rate_kbps: f64,
    pub cumulative_upload_bytes: u64,
    pub cumulative_download_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThroughputSample {
    pub timestamp: i64,
    pub upload_rate_kbps: f64,
    pub download_rate_kbps: f64,
    pub cumulative_upload_bytes: u64,
    pub cumulative_download_bytes: u64,
}

impl ThroughputSample {
    pub fn from_reading(timestamp: i64, r: &TrafficReading) -> Self {
        Self {
            timestamp,
            upload_rate_kbps: r.upload_rate_kbps,
            download_rate_kbps: r.download_rate_kbps,
            cumulative_upload_bytes: r.cumulative_upload_bytes,
            cumulative_download_bytes: r.cumulative_download_bytes,
        }
    }
}

/// Probe result for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyReading {
    pub target: String,
    pub latency_ms: f64,
    pub packet_loss_pct: f64,
    pub jitter_ms: f64,
}

/// One row per (tick, target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySample {
    pub timestamp: i64,
    pub target: String,
    pub latency_ms: f64,
    pub packet_loss_pct: f64,
    pub jitter_ms: f64,
}

impl LatencySample {
    pub fn from_reading(timestamp: i64, r: &LatencyReading) -> Self {
        Self {
            timestamp,
            target: r.target.clone(),
            latency_ms: r.latency_ms,
            packet_loss_pct: r.packet_loss_pct,
            jitter_ms: r.jitter_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReading {
    pub signal_strength_pct: f64,
    pub stability_pct: f64,
    pub error_rate_pct: f64,
    pub retransmit_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySample {
    pub timestamp: i64,
    pub signal_strength_pct: f64,
    pub stability_pct: f64,
    pub error_rate_pct: f64,
    pub retransmit_rate_pct: f64,
}

impl QualitySample {
    pub fn from_reading(timestamp: i64, r: &QualityReading) -> Self {
        Self {
            timestamp,
            signal_strength_pct: r.signal_strength_pct,
            stability_pct: r.stability_pct,
            error_rate_pct: r.error_rate_pct,
            retransmit_rate_pct: r.retransmit_rate_pct,
        }
    }
}

// Kind discriminators: the five collected metric kinds, the four retention-bound series,
// and the rollup period types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five metric categories pulled from the source every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Throughput,
    Devices,
    Latency,
    Health,
    Quality,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Throughput,
        MetricKind::Devices,
        MetricKind::Latency,
        MetricKind::Health,
        MetricKind::Quality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Throughput => "throughput",
            MetricKind::Devices => "devices",
            MetricKind::Latency => "latency",
            MetricKind::Health => "health",
            MetricKind::Quality => "quality",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only time-series tables. Devices and rollups are not series and never age out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Throughput,
    Latency,
    Health,
    Quality,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 4] = [
        SeriesKind::Throughput,
        SeriesKind::Latency,
        SeriesKind::Health,
        SeriesKind::Quality,
    ];

    /// Backing SQLite table.
    pub fn table(&self) -> &'static str {
        match self {
            SeriesKind::Throughput => "network_traffic",
            SeriesKind::Latency => "network_latency",
            SeriesKind::Health => "router_status",
            SeriesKind::Quality => "connection_quality",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Throughput => "throughput",
            SeriesKind::Latency => "latency",
            SeriesKind::Health => "health",
            SeriesKind::Quality => "quality",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bandwidth rollup period; serializes to lowercase JSON ("daily", "monthly").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Daily,
    Monthly,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Daily => "daily",
            PeriodType::Monthly => "monthly",
        }
    }

    /// Parse the stored discriminator. Unknown values yield None.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(PeriodType::Daily),
            "monthly" => Some(PeriodType::Monthly),
            _ => None,
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

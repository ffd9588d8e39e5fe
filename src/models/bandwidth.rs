// Bandwidth rollup: one row per (period_key, period_type), overwritten every tick.

use serde::{Deserialize, Serialize};

use super::{PeriodType, ThroughputSample};

/// Values written into a rollup row. Last write wins; nothing is summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupTotals {
    pub cumulative_upload: u64,
    pub cumulative_download: u64,
    pub peak_upload_rate: f64,
    pub peak_download_rate: f64,
}

impl RollupTotals {
    /// "Peak" rates are the sample's current rates, not a running maximum.
    pub fn from_sample(s: &ThroughputSample) -> Self {
        Self {
            cumulative_upload: s.cumulative_upload_bytes,
            cumulative_download: s.cumulative_download_bytes,
            peak_upload_rate: s.upload_rate_kbps,
            peak_download_rate: s.download_rate_kbps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandwidthRollup {
    /// `YYYY-MM-DD`; first of month for monthly rows.
    pub period_key: String,
    pub period_type: PeriodType,
    pub cumulative_upload: u64,
    pub cumulative_download: u64,
    pub peak_upload_rate: f64,
    pub peak_download_rate: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

// Bandwidth rollups: daily (today's UTC date) and monthly (first of the UTC month),
// overwritten from each throughput sample the collector ingests.

use chrono::{DateTime, Datelike, Utc};
use tracing::debug;

use crate::error::StoreError;
use crate::history_repo::TelemetryStore;
use crate::models::{PeriodType, RollupTotals, ThroughputSample};

/// `YYYY-MM-DD` key of the period containing `at`.
pub fn period_key(period_type: PeriodType, at: DateTime<Utc>) -> String {
    match period_type {
        PeriodType::Daily => at.format("%Y-%m-%d").to_string(),
        PeriodType::Monthly => format!("{:04}-{:02}-01", at.year(), at.month()),
    }
}

/// Upserts the daily then the monthly rollup for `sample`. Applying the same sample
/// twice leaves the same rows (totals are overwritten, never added).
pub async fn update_rollups(
    store: &dyn TelemetryStore,
    sample: &ThroughputSample,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let totals = RollupTotals::from_sample(sample);
    let now_ms = now.timestamp_millis();
    for period_type in [PeriodType::Daily, PeriodType::Monthly] {
        let key = period_key(period_type, now);
        store
            .upsert_rollup(&key, period_type, &totals, now_ms)
            .await?;
        debug!(period_key = %key, period_type = %period_type, "rollup updated");
    }
    Ok(())
}

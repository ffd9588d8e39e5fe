// Degraded-mode store: used when the database could not be opened at startup.
// Collection keeps ticking; every write reports Unavailable and is logged by the caller.

use async_trait::async_trait;

use super::TelemetryStore;
use crate::error::StoreError;
use crate::models::{
    DeviceRecord, HealthSample, LatencySample, PeriodType, QualitySample, RollupTotals,
    SeriesKind, ThroughputSample,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

#[async_trait]
impl TelemetryStore for UnavailableStore {
    async fn append_throughput(&self, _sample: &ThroughputSample) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn append_latency(&self, _samples: &[LatencySample]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn append_health(&self, _sample: &HealthSample) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn append_quality(&self, _sample: &QualitySample) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn upsert_devices(&self, _devices: &[DeviceRecord]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn upsert_rollup(
        &self,
        _period_key: &str,
        _period_type: PeriodType,
        _totals: &RollupTotals,
        _now_ms: i64,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn delete_older_than(
        &self,
        _kind: SeriesKind,
        _cutoff_ms: i64,
    ) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable)
    }
}

// Domain models: source readings, stored records, kind discriminators

mod bandwidth;
mod device;
mod kind;
mod network;
mod system;

pub use bandwidth::{BandwidthRollup, RollupTotals};
pub use device::{DeviceReading, DeviceRecord, normalize_mac};
pub use kind::{MetricKind, PeriodType, SeriesKind};
pub use network::{
    LatencyReading, LatencySample, QualityReading, QualitySample, ThroughputSample,
    TrafficReading,
};
pub use system::{HealthReading, HealthSample};

/// Wall-clock milliseconds since the Unix epoch; the timestamp unit of every stored row.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// Router health models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReading {
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub mem_total_bytes: u64,
    pub mem_used_bytes: u64,
    pub temperature_c: f64,
    pub uptime_secs: u64,
    pub load_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSample {
    pub timestamp: i64,
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub mem_total_bytes: u64,
    pub mem_used_bytes: u64,
    pub temperature_c: f64,
    pub uptime_secs: u64,
    pub load_average: f64,
}

impl HealthSample {
    pub fn from_reading(timestamp: i64, r: &HealthReading) -> Self {
        Self {
            timestamp,
            cpu_pct: r.cpu_pct,
            mem_pct: r.mem_pct,
            mem_total_bytes: r.mem_total_bytes,
            mem_used_bytes: r.mem_used_bytes,
            temperature_c: r.temperature_c,
            uptime_secs: r.uptime_secs,
            load_average: r.load_average,
        }
    }
}

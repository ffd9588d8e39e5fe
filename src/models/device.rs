// Connected device models

use serde::{Deserialize, Serialize};

/// A device visible in the source's snapshot this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReading {
    pub mac_address: String,
    pub ip_address: String,
    pub hostname: Option<String>,
    pub device_type: Option<String>,
    pub upload_rate_kbps: f64,
    pub download_rate_kbps: f64,
}

/// Current observed state of one device. Identity is `mac_address` (lower-case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub mac_address: String,
    pub ip_address: String,
    pub hostname: Option<String>,
    pub device_type: Option<String>,
    pub is_online: bool,
    pub last_seen: i64,
    pub upload_rate_kbps: f64,
    pub download_rate_kbps: f64,
}

impl DeviceRecord {
    /// Marks the device online and seen at `seen_at`.
    pub fn from_reading(seen_at: i64, r: &DeviceReading) -> Self {
        Self {
            mac_address: normalize_mac(&r.mac_address),
            ip_address: r.ip_address.clone(),
            hostname: r.hostname.clone().filter(|h| !h.is_empty()),
            device_type: r.device_type.clone().filter(|t| !t.is_empty()),
            is_online: true,
            last_seen: seen_at,
            upload_rate_kbps: r.upload_rate_kbps,
            download_rate_kbps: r.download_rate_kbps,
        }
    }
}

/// Lower-case, trimmed MAC so "AA:BB:.." and "aa:bb:.." are the same device.
pub fn normalize_mac(mac: &str) -> String {
    mac.trim().to_ascii_lowercase()
}

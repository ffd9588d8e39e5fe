// Metrics sources. The collector only sees the MetricsSource trait; HostSource samples
// the machine the process runs on (the router itself) via sysinfo and /proc.

pub mod probe;
pub mod procfs;

use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::models::{
    DeviceReading, HealthReading, LatencyReading, QualityReading, TrafficReading,
};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sysinfo::{Components, Networks, System};
use tracing::{debug, instrument};

/// Five independent, individually failable fetches. Implementations must not panic on
/// a failed fetch; the collector treats any `Err` as a failure of that kind for one cycle.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn throughput(&self) -> Result<TrafficReading, SourceError>;

    /// Devices currently visible on the network.
    async fn devices(&self) -> Result<Vec<DeviceReading>, SourceError>;

    /// One reading per entry of `targets`.
    async fn latency(&self, targets: &[String]) -> Result<Vec<LatencyReading>, SourceError>;

    async fn health(&self) -> Result<HealthReading, SourceError>;

    async fn quality(&self) -> Result<QualityReading, SourceError>;
}

/// Interface counter totals at one instant.
#[derive(Debug, Clone, Copy, Default)]
struct LinkTotals {
    bytes_tx: u64,
    bytes_rx: u64,
    packets: u64,
    errors: u64,
}

#[derive(Debug, Clone, Copy)]
struct QualityBaseline {
    link: LinkTotals,
    tcp: Option<procfs::TcpCounters>,
}

pub struct HostSource {
    settings: SourceSettings,
    sys: Arc<Mutex<System>>,
    networks: Arc<Mutex<Networks>>,
    components: Arc<Mutex<Components>>,
    last_traffic: Arc<Mutex<Option<(LinkTotals, Instant)>>>,
    last_quality: Arc<Mutex<Option<QualityBaseline>>>,
}

impl HostSource {
    pub fn new(settings: SourceSettings) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self {
            settings,
            sys: Arc::new(Mutex::new(sys)),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            components: Arc::new(Mutex::new(Components::new_with_refreshed_list())),
            last_traffic: Arc::new(Mutex::new(None)),
            last_quality: Arc::new(Mutex::new(None)),
        }
    }

    /// Refreshes interface counters and sums the selected interfaces.
    async fn link_totals(&self) -> Result<LinkTotals, SourceError> {
        let networks = self.networks.clone();
        let wan = self.settings.wan_interface.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks = networks
                .lock()
                .map_err(|e| SourceError::Unavailable(format!("networks lock poisoned: {}", e)))?;
            networks.refresh(true);
            let mut totals = LinkTotals::default();
            let mut matched = false;
            for (name, data) in networks.list() {
                let selected = match wan.as_deref() {
                    Some(wan) => name == wan,
                    None => counts_toward_totals(name),
                };
                if !selected {
                    continue;
                }
                matched = true;
                totals.bytes_tx += data.total_transmitted();
                totals.bytes_rx += data.total_received();
                totals.packets += data.total_packets_transmitted() + data.total_packets_received();
                totals.errors +=
                    data.total_errors_on_transmitted() + data.total_errors_on_received();
            }
            if !matched {
                return Err(SourceError::Unavailable(match wan {
                    Some(wan) => format!("interface {} not found", wan),
                    None => "no network interfaces".into(),
                }));
            }
            Ok(totals)
        })
        .await
        .map_err(|e| SourceError::Unavailable(format!("sysinfo task join: {}", e)))?
    }

    async fn read_optional(path: &str) -> Option<String> {
        match tokio::fs::read_to_string(path).await {
            Ok(s) => Some(s),
            Err(e) => {
                debug!(path, error = %e, "optional source file unreadable");
                None
            }
        }
    }
}

#[async_trait]
impl MetricsSource for HostSource {
    #[instrument(skip(self), fields(source = "host", operation = "throughput"))]
    async fn throughput(&self) -> Result<TrafficReading, SourceError> {
        let totals = self.link_totals().await?;
        let now = Instant::now();
        let mut guard = self
            .last_traffic
            .lock()
            .map_err(|e| SourceError::Unavailable(format!("traffic lock poisoned: {}", e)))?;
        let (upload_rate_kbps, download_rate_kbps) = match *guard {
            Some((prev, prev_ts)) => {
                let dt_secs = now.duration_since(prev_ts).as_secs_f64();
                if dt_secs > 0.0 {
                    (
                        totals.bytes_tx.saturating_sub(prev.bytes_tx) as f64 / 1024.0 / dt_secs,
                        totals.bytes_rx.saturating_sub(prev.bytes_rx) as f64 / 1024.0 / dt_secs,
                    )
                } else {
                    (0.0, 0.0)
                }
            }
            None => (0.0, 0.0),
        };
        *guard = Some((totals, now));
        Ok(TrafficReading {
            upload_rate_kbps,
            download_rate_kbps,
            cumulative_upload_bytes: totals.bytes_tx,
            cumulative_download_bytes: totals.bytes_rx,
        })
    }

    #[instrument(skip(self), fields(source = "host", operation = "devices"))]
    async fn devices(&self) -> Result<Vec<DeviceReading>, SourceError> {
        let arp = tokio::fs::read_to_string(&self.settings.arp_path).await?;
        let hostnames = Self::read_optional(&self.settings.leases_path)
            .await
            .map(|s| procfs::parse_leases(&s))
            .unwrap_or_default();
        Ok(procfs::parse_arp(&arp)
            .into_iter()
            .map(|entry| DeviceReading {
                hostname: hostnames.get(&entry.mac_address).cloned(),
                mac_address: entry.mac_address,
                ip_address: entry.ip_address,
                device_type: None,
                upload_rate_kbps: 0.0,
                download_rate_kbps: 0.0,
            })
            .collect())
    }

    #[instrument(skip(self, targets), fields(source = "host", operation = "latency", targets_count = targets.len()))]
    async fn latency(&self, targets: &[String]) -> Result<Vec<LatencyReading>, SourceError> {
        let timeout = Duration::from_millis(self.settings.probe_timeout_ms);
        let count = self.settings.probe_count;
        let readings = join_all(
            targets
                .iter()
                .map(|t| probe::probe_target(t, count, timeout)),
        )
        .await;
        Ok(readings)
    }

    #[instrument(skip(self), fields(source = "host", operation = "health"))]
    async fn health(&self) -> Result<HealthReading, SourceError> {
        let sys = self.sys.clone();
        let components = self.components.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| SourceError::Unavailable(format!("sysinfo lock poisoned: {}", e)))?;
            sys.refresh_cpu_usage();
            sys.refresh_memory();

            let total = sys.total_memory();
            let used = total.saturating_sub(sys.available_memory());
            let mem_pct = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };

            let temperature_c = match components.lock() {
                Ok(mut components) => {
                    components.refresh(false);
                    components
                        .list()
                        .iter()
                        .filter_map(|c| c.temperature())
                        .filter(|t| t.is_finite())
                        .fold(None, |max: Option<f32>, t| Some(max.map_or(t, |m| m.max(t))))
                        .map(f64::from)
                        .unwrap_or(0.0)
                }
                Err(_) => 0.0,
            };

            Ok(HealthReading {
                cpu_pct: f64::from(sys.global_cpu_usage()).clamp(0.0, 100.0),
                mem_pct,
                mem_total_bytes: total,
                mem_used_bytes: used,
                temperature_c,
                uptime_secs: System::uptime(),
                load_average: System::load_average().one,
            })
        })
        .await
        .map_err(|e| SourceError::Unavailable(format!("sysinfo task join: {}", e)))?
    }

    #[instrument(skip(self), fields(source = "host", operation = "quality"))]
    async fn quality(&self) -> Result<QualityReading, SourceError> {
        let link = self.link_totals().await?;
        let tcp = Self::read_optional("/proc/net/snmp")
            .await
            .and_then(|s| procfs::parse_tcp_counters(&s));
        let signal_strength_pct = Self::read_optional("/proc/net/wireless")
            .await
            .and_then(|s| {
                procfs::parse_wireless_quality(&s, self.settings.wan_interface.as_deref())
            })
            .unwrap_or(100.0);

        let current = QualityBaseline { link, tcp };
        let previous = {
            let mut guard = self
                .last_quality
                .lock()
                .map_err(|e| SourceError::Unavailable(format!("quality lock poisoned: {}", e)))?;
            guard.replace(current)
        };

        let (error_rate_pct, retransmit_rate_pct) = match previous {
            Some(prev) => {
                let d_packets = link.packets.saturating_sub(prev.link.packets);
                let d_errors = link.errors.saturating_sub(prev.link.errors);
                let error_rate = ratio_pct(d_errors, d_packets);
                let retransmit = match (prev.tcp, tcp) {
                    (Some(p), Some(c)) => ratio_pct(
                        c.retrans_segs.saturating_sub(p.retrans_segs),
                        c.out_segs.saturating_sub(p.out_segs),
                    ),
                    _ => 0.0,
                };
                (error_rate, retransmit)
            }
            None => (0.0, 0.0),
        };

        Ok(QualityReading {
            signal_strength_pct,
            stability_pct: (100.0 - error_rate_pct - retransmit_rate_pct).clamp(0.0, 100.0),
            error_rate_pct,
            retransmit_rate_pct,
        })
    }
}

/// Interface name prefixes left out of totals when no WAN interface is configured:
/// loopback, bridges and virtual links whose traffic also crosses a physical port.
const NON_PHYSICAL_PREFIXES: &[&str] = &[
    "lo", "br", "veth", "docker", "virbr", "vnet", "tun", "tap", "ifb", "dummy",
];

/// Whether `name` is summed into link totals when `wan_interface` is unset.
/// Routers should set `wan_interface`; LAN ports still see forwarded WAN traffic.
pub fn counts_toward_totals(name: &str) -> bool {
    !name.contains('.') && !NON_PHYSICAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn ratio_pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
    }
}

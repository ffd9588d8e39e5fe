use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub collector: CollectorSettings,
    #[serde(default)]
    pub retention: RetentionSettings,
    #[serde(default)]
    pub source: SourceSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_pool_size: default_max_pool_size(),
        }
    }
}

fn default_db_path() -> String {
    "data/telemetry.db".into()
}

fn default_max_pool_size() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSettings {
    /// Start collecting as soon as the process is up.
    #[serde(default = "default_true")]
    pub auto_start: bool,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Upper bound for each source fetch; a slower fetch counts as a failure for that kind.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_latency_targets")]
    pub latency_targets: Vec<String>,
    /// How often to log collector stats (cycles, failures per kind) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            auto_start: true,
            tick_interval_ms: default_tick_interval_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            latency_targets: default_latency_targets(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_latency_targets() -> Vec<String> {
    vec!["8.8.8.8:53".into(), "1.1.1.1:53".into()]
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionSettings {
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    /// Optional cron expression for VACUUM (e.g. "0 0 3 * * *" = 03:00 daily). Uses local time.
    #[serde(default)]
    pub vacuum_schedule: Option<String>,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            sweep_interval_ms: default_sweep_interval_ms(),
            horizon_days: default_horizon_days(),
            vacuum_schedule: None,
        }
    }
}

fn default_sweep_interval_ms() -> u64 {
    3_600_000
}

fn default_horizon_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    /// Interface carrying internet traffic. Set this on a router: when None, physical
    /// interfaces are summed (bridges, VLANs and virtual links skipped), and LAN ports
    /// still carry forwarded WAN traffic.
    #[serde(default)]
    pub wan_interface: Option<String>,
    #[serde(default = "default_arp_path")]
    pub arp_path: String,
    /// dnsmasq lease file used for hostnames; missing file is fine.
    #[serde(default = "default_leases_path")]
    pub leases_path: String,
    #[serde(default = "default_probe_count")]
    pub probe_count: u32,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            wan_interface: None,
            arp_path: default_arp_path(),
            leases_path: default_leases_path(),
            probe_count: default_probe_count(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_arp_path() -> String {
    "/proc/net/arp".into()
}

fn default_leases_path() -> String {
    "/tmp/dhcp.leases".into()
}

fn default_probe_count() -> u32 {
    3
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

impl CollectorSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl RetentionSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn horizon(&self) -> Duration {
        Duration::from_secs(u64::from(self.horizon_days) * 24 * 60 * 60)
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.collector.tick_interval_ms > 0,
            "collector.tick_interval_ms must be > 0, got {}",
            self.collector.tick_interval_ms
        );
        anyhow::ensure!(
            self.collector.fetch_timeout_ms > 0,
            "collector.fetch_timeout_ms must be > 0, got {}",
            self.collector.fetch_timeout_ms
        );
        anyhow::ensure!(
            !self.collector.latency_targets.is_empty(),
            "collector.latency_targets must list at least one target"
        );
        anyhow::ensure!(
            self.collector.stats_log_interval_secs > 0,
            "collector.stats_log_interval_secs must be > 0, got {}",
            self.collector.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.retention.sweep_interval_ms > 0,
            "retention.sweep_interval_ms must be > 0, got {}",
            self.retention.sweep_interval_ms
        );
        anyhow::ensure!(
            self.retention.horizon_days > 0,
            "retention.horizon_days must be > 0, got {}",
            self.retention.horizon_days
        );
        if let Some(ref schedule) = self.retention.vacuum_schedule {
            anyhow::ensure!(
                <cron::Schedule as std::str::FromStr>::from_str(schedule).is_ok(),
                "retention.vacuum_schedule is not a valid cron expression: {}",
                schedule
            );
        }
        anyhow::ensure!(
            self.source.probe_count > 0,
            "source.probe_count must be > 0, got {}",
            self.source.probe_count
        );
        anyhow::ensure!(
            self.source.probe_timeout_ms > 0,
            "source.probe_timeout_ms must be > 0, got {}",
            self.source.probe_timeout_ms
        );
        Ok(())
    }
}

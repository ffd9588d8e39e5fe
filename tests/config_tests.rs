// Config loading and validation tests

use routerwatch::config::AppConfig;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[database]
path = "data/telemetry.db"
max_pool_size = 4

[collector]
auto_start = false
tick_interval_ms = 500
fetch_timeout_ms = 2000
latency_targets = ["9.9.9.9:53"]
stats_log_interval_secs = 30

[retention]
sweep_interval_ms = 60000
horizon_days = 3

[source]
wan_interface = "eth0"
probe_count = 2
probe_timeout_ms = 250
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.database.path, "data/telemetry.db");
    assert_eq!(config.database.max_pool_size, 4);
    assert!(!config.collector.auto_start);
    assert_eq!(config.collector.tick_interval(), Duration::from_millis(500));
    assert_eq!(config.collector.fetch_timeout(), Duration::from_secs(2));
    assert_eq!(config.collector.latency_targets, vec!["9.9.9.9:53"]);
    assert_eq!(config.retention.sweep_interval(), Duration::from_secs(60));
    assert_eq!(config.retention.horizon(), Duration::from_secs(3 * 86_400));
    assert_eq!(config.source.wan_interface.as_deref(), Some("eth0"));
    assert_eq!(config.source.probe_count, 2);
}

#[test]
fn test_config_defaults_when_empty() {
    let config = AppConfig::load_from_str("").expect("empty config uses defaults");
    assert!(config.collector.auto_start);
    assert_eq!(config.collector.tick_interval_ms, 1000);
    assert_eq!(config.collector.fetch_timeout_ms, 10_000);
    assert_eq!(config.collector.latency_targets.len(), 2);
    assert_eq!(config.retention.sweep_interval_ms, 3_600_000);
    assert_eq!(config.retention.horizon_days, 7);
    assert!(config.retention.vacuum_schedule.is_none());
    assert_eq!(config.source.arp_path, "/proc/net/arp");
    assert!(config.source.wan_interface.is_none());
}

#[test]
fn test_config_validation_rejects_empty_db_path() {
    let bad = VALID_CONFIG.replace("path = \"data/telemetry.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn test_config_validation_rejects_max_pool_size_zero() {
    let bad = VALID_CONFIG.replace("max_pool_size = 4", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_pool_size"));
}

#[test]
fn test_config_validation_rejects_tick_interval_zero() {
    let bad = VALID_CONFIG.replace("tick_interval_ms = 500", "tick_interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("collector.tick_interval_ms"));
}

#[test]
fn test_config_validation_rejects_fetch_timeout_zero() {
    let bad = VALID_CONFIG.replace("fetch_timeout_ms = 2000", "fetch_timeout_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("fetch_timeout_ms"));
}

#[test]
fn test_config_validation_rejects_empty_latency_targets() {
    let bad = VALID_CONFIG.replace("latency_targets = [\"9.9.9.9:53\"]", "latency_targets = []");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("latency_targets"));
}

#[test]
fn test_config_validation_rejects_sweep_interval_zero() {
    let bad = VALID_CONFIG.replace("sweep_interval_ms = 60000", "sweep_interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("retention.sweep_interval_ms"));
}

#[test]
fn test_config_validation_rejects_horizon_zero() {
    let bad = VALID_CONFIG.replace("horizon_days = 3", "horizon_days = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("horizon_days"));
}

#[test]
fn test_config_validation_rejects_probe_count_zero() {
    let bad = VALID_CONFIG.replace("probe_count = 2", "probe_count = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("probe_count"));
}

#[test]
fn test_config_vacuum_schedule_valid_cron() {
    let good = VALID_CONFIG.replace(
        "horizon_days = 3",
        "horizon_days = 3\nvacuum_schedule = \"0 0 3 * * *\"",
    );
    let config = AppConfig::load_from_str(&good).expect("valid cron");
    assert_eq!(config.retention.vacuum_schedule.as_deref(), Some("0 0 3 * * *"));
}

#[test]
fn test_config_vacuum_schedule_rejects_bad_cron() {
    let bad = VALID_CONFIG.replace(
        "horizon_days = 3",
        "horizon_days = 3\nvacuum_schedule = \"every night\"",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("vacuum_schedule"));
}

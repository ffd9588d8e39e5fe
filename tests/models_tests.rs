// Model serde shape and conversions

use routerwatch::models::*;

#[test]
fn samples_serialize_camel_case() {
    let sample = ThroughputSample::from_reading(
        1_000,
        &TrafficReading {
            upload_rate_kbps: 1.5,
            download_rate_kbps: 2.5,
            cumulative_upload_bytes: 10,
            cumulative_download_bytes: 20,
        },
    );
    let json = serde_json::to_value(&sample).unwrap();
    assert_eq!(json["uploadRateKbps"], 1.5);
    assert_eq!(json["cumulativeDownloadBytes"], 20);
    assert_eq!(json["timestamp"], 1_000);
}

#[test]
fn period_type_round_trips_lowercase() {
    assert_eq!(serde_json::to_string(&PeriodType::Monthly).unwrap(), "\"monthly\"");
    assert_eq!(PeriodType::parse("daily"), Some(PeriodType::Daily));
    assert_eq!(PeriodType::parse("weekly"), None);
}

#[test]
fn series_kinds_map_to_tables() {
    let tables: Vec<&str> = SeriesKind::ALL.iter().map(|k| k.table()).collect();
    assert_eq!(
        tables,
        ["network_traffic", "network_latency", "router_status", "connection_quality"]
    );
    assert_eq!(MetricKind::ALL.len(), 5);
}

#[test]
fn device_record_normalizes_reading() {
    let reading = DeviceReading {
        mac_address: " AA:BB:CC:DD:EE:FF ".into(),
        ip_address: "10.0.0.2".into(),
        hostname: Some(String::new()),
        device_type: Some("phone".into()),
        upload_rate_kbps: 0.0,
        download_rate_kbps: 0.0,
    };
    let record = DeviceRecord::from_reading(42, &reading);
    assert_eq!(record.mac_address, "aa:bb:cc:dd:ee:ff");
    assert_eq!(record.hostname, None);
    assert_eq!(record.device_type.as_deref(), Some("phone"));
    assert!(record.is_online);
    assert_eq!(record.last_seen, 42);
    assert_eq!(normalize_mac("Aa:01"), "aa:01");
}

#[test]
fn rollup_totals_take_latest_rates() {
    let sample = ThroughputSample {
        timestamp: 1,
        upload_rate_kbps: 3.0,
        download_rate_kbps: 4.0,
        cumulative_upload_bytes: 100,
        cumulative_download_bytes: 200,
    };
    let totals = RollupTotals::from_sample(&sample);
    assert_eq!(totals.cumulative_upload, 100);
    assert_eq!(totals.peak_download_rate, 4.0);
}

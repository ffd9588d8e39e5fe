// Latency probing by timed TCP connects.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tracing::debug;

use crate::models::LatencyReading;

/// Port used when a target is given without one.
const DEFAULT_PROBE_PORT: u16 = 53;

/// `host:port` to connect to for `target`. Bare IPv6 addresses are bracketed.
pub fn probe_address(target: &str) -> String {
    if target.parse::<SocketAddr>().is_ok() {
        return target.to_string();
    }
    if let Ok(ip) = target.parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_PROBE_PORT).to_string();
    }
    if target.starts_with('[') && target.ends_with(']') {
        return format!("{}:{}", target, DEFAULT_PROBE_PORT);
    }
    if target.contains(':') {
        target.to_string()
    } else {
        format!("{}:{}", target, DEFAULT_PROBE_PORT)
    }
}

/// Latency, loss and jitter from `attempts` probes of which `rtts_ms` succeeded (in order).
/// Jitter is the mean absolute difference between consecutive successful round trips.
pub fn summarize(target: &str, attempts: u32, rtts_ms: &[f64]) -> LatencyReading {
    let ok = rtts_ms.len() as f64;
    let latency_ms = if rtts_ms.is_empty() {
        0.0
    } else {
        rtts_ms.iter().sum::<f64>() / ok
    };
    let packet_loss_pct = if attempts == 0 {
        0.0
    } else {
        (f64::from(attempts) - ok).max(0.0) / f64::from(attempts) * 100.0
    };
    let jitter_ms = if rtts_ms.len() < 2 {
        0.0
    } else {
        let diffs: f64 = rtts_ms.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
        diffs / (rtts_ms.len() - 1) as f64
    };
    LatencyReading {
        target: target.to_string(),
        latency_ms,
        packet_loss_pct,
        jitter_ms,
    }
}

/// Runs `count` sequential connects against `target`, each bounded by `timeout`.
pub async fn probe_target(target: &str, count: u32, timeout: Duration) -> LatencyReading {
    let addr = probe_address(target);
    let mut rtts = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let started = Instant::now();
        match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(_stream)) => rtts.push(started.elapsed().as_secs_f64() * 1000.0),
            Ok(Err(e)) => debug!(target = %addr, error = %e, "probe connect failed"),
            Err(_) => debug!(target = %addr, "probe timed out"),
        }
    }
    summarize(target, count, &rtts)
}

// Dump the newest telemetry rows as JSON.
//
// Usage: cargo run --bin dump_telemetry -- [DB_PATH] [LIMIT]
//   DB_PATH  default: ./data/telemetry.db
//   LIMIT    default: 5 (latency rows)

use routerwatch::history_repo::HistoryRepo;
use routerwatch::models::PeriodType;
use serde_json::json;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("./data/telemetry.db");
    let limit: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5);

    let repo = HistoryRepo::connect(path, 1).await?;
    let today = routerwatch::aggregator::period_key(PeriodType::Daily, chrono::Utc::now());

    let dump = json!({
        "throughput": repo.latest_throughput().await?,
        "latency": repo.latest_latency(limit).await?,
        "health": repo.latest_health().await?,
        "quality": repo.latest_quality().await?,
        "devices": repo.devices(false).await?,
        "daily": repo.rollup(&today, PeriodType::Daily).await?,
        "bandwidthUsage": repo.bandwidth_usage("").await?,
    });
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}

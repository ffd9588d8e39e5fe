// Retention sweep tests: strict cutoff, exempt tables, per-table isolation

mod common;

use common::*;
use routerwatch::history_repo::TelemetryStore;
use routerwatch::models::*;
use routerwatch::retention::RetentionSweeper;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const DAY_MS: i64 = 86_400_000;
const NOW_MS: i64 = 1_710_000_000_000;

#[tokio::test]
async fn sweep_deletes_only_rows_before_cutoff() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;
    let sweeper = RetentionSweeper::new(repo.clone(), Duration::from_secs(7 * 86_400));
    let cutoff = NOW_MS - 7 * DAY_MS;
    assert_eq!(sweeper.cutoff(NOW_MS), cutoff);

    seed_series(&repo, cutoff - 1_000).await;
    seed_series(&repo, cutoff).await;
    seed_series(&repo, cutoff + 1_000).await;

    let report = sweeper.sweep_at(NOW_MS).await;

    assert!(report.atomic);
    assert!(report.failed_kinds().is_empty());
    assert_eq!(report.deleted_total(), 4);
    for kind in SeriesKind::ALL {
        assert_eq!(repo.count_rows(kind).await.unwrap(), 2, "{}", kind);
    }
}

#[tokio::test]
async fn sweep_never_touches_devices_or_rollups() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;
    let sweeper = RetentionSweeper::new(repo.clone(), Duration::from_secs(7 * 86_400));

    repo.upsert_devices(&[DeviceRecord::from_reading(
        NOW_MS - 30 * DAY_MS,
        &device("aa:bb:cc:00:00:10", "192.168.1.20", None),
    )])
    .await
    .unwrap();
    repo.upsert_rollup(
        "2023-01-01",
        PeriodType::Monthly,
        &RollupTotals::from_sample(&throughput_sample(1)),
        1,
    )
    .await
    .unwrap();

    sweeper.sweep_at(NOW_MS).await;

    assert_eq!(repo.count_devices().await.unwrap(), 1);
    assert_eq!(repo.count_rollups().await.unwrap(), 1);
}

#[tokio::test]
async fn sweep_falls_back_per_table_when_one_fails() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;
    let mut store = FailingStore::new(repo.clone());
    store.fail_prune_all = true;
    store.fail_deletes.insert(SeriesKind::Latency);
    let sweeper = RetentionSweeper::new(Arc::new(store), Duration::from_secs(86_400));

    seed_series(&repo, NOW_MS - 2 * DAY_MS).await;

    let report = sweeper.sweep_at(NOW_MS).await;

    assert!(!report.atomic);
    assert_eq!(report.failed_kinds(), vec![SeriesKind::Latency]);
    assert_eq!(repo.count_rows(SeriesKind::Latency).await.unwrap(), 1);
    assert_eq!(repo.count_rows(SeriesKind::Throughput).await.unwrap(), 0);
    assert_eq!(repo.count_rows(SeriesKind::Health).await.unwrap(), 0);
    assert_eq!(repo.count_rows(SeriesKind::Quality).await.unwrap(), 0);
}

#[tokio::test]
async fn sweep_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;
    let sweeper = RetentionSweeper::new(repo.clone(), Duration::from_secs(86_400));

    seed_series(&repo, NOW_MS - 2 * DAY_MS).await;
    seed_series(&repo, NOW_MS).await;

    assert_eq!(sweeper.sweep_at(NOW_MS).await.deleted_total(), 4);
    assert_eq!(sweeper.sweep_at(NOW_MS).await.deleted_total(), 0);
    for kind in SeriesKind::ALL {
        assert_eq!(repo.count_rows(kind).await.unwrap(), 1, "{}", kind);
    }
}

#[tokio::test]
async fn sweep_on_empty_store_deletes_nothing() {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir).await;
    let sweeper = RetentionSweeper::new(repo, Duration::from_secs(86_400));

    let report = sweeper.sweep().await;
    assert_eq!(report.deleted_total(), 0);
    assert!(report.failed_kinds().is_empty());
}

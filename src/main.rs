use anyhow::Result;
use routerwatch::history_repo::{HistoryRepo, TelemetryStore, UnavailableStore};
use routerwatch::lifecycle::TelemetryService;
use routerwatch::source::HostSource;
use routerwatch::{config, version};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Opens and initializes the SQLite store. On failure the service still runs and every
/// write reports the store as unavailable.
async fn open_store(config: &config::DatabaseConfig) -> Arc<dyn TelemetryStore> {
    let repo = async {
        let repo = HistoryRepo::connect(&config.path, config.max_pool_size).await?;
        repo.init().await?;
        anyhow::Ok(repo)
    }
    .await;
    match repo {
        Ok(repo) => {
            tracing::info!(path = %config.path, "telemetry store ready");
            Arc::new(repo)
        }
        Err(e) => {
            tracing::warn!(path = %config.path, error = %e, "telemetry store unavailable; samples will be dropped");
            Arc::new(UnavailableStore)
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(name = version::NAME, version = version::VERSION, "starting");

    let store = open_store(&app_config.database).await;
    let source = Arc::new(HostSource::new(app_config.source.clone()));
    let service = TelemetryService::from_config(&app_config, source, store);

    if app_config.collector.auto_start {
        service.start(app_config.collector.tick_interval());
    } else {
        tracing::info!("collector.auto_start is off; not collecting");
    }

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    service.stop().await;
    Ok(())
}

// Start/stop control over the collection loop and the retention sweeper. Both loops share
// one state; start while running or stopping and stop while stopped are logged no-ops.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::collector::{Collector, CollectorConfig};
use crate::config::AppConfig;
use crate::history_repo::TelemetryStore;
use crate::retention::{self, RetentionSweeper, SweeperConfig};
use crate::source::MetricsSource;
use crate::worker::{self, WorkerConfig};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub sweeper: SweeperConfig,
    pub stats_log_interval: Duration,
}

enum State {
    Stopped,
    Running(Running),
    /// Shutdown sent; the old loops may still be finishing a cycle or sweep.
    Stopping,
}

struct Running {
    collector_tx: oneshot::Sender<()>,
    collector_handle: JoinHandle<()>,
    sweeper_tx: oneshot::Sender<()>,
    sweeper_handle: JoinHandle<()>,
}

pub struct TelemetryService {
    collector: Arc<Collector>,
    sweeper: Arc<RetentionSweeper>,
    settings: ServiceSettings,
    state: Mutex<State>,
}

/// Returns the state to Stopped once the old loops are joined, even if `stop` is dropped early.
struct StoppingGuard<'a>(&'a Mutex<State>);

impl Drop for StoppingGuard<'_> {
    fn drop(&mut self) {
        match self.0.lock() {
            Ok(mut state) => *state = State::Stopped,
            Err(e) => warn!(error = %e, "lifecycle lock poisoned; state not reset"),
        }
    }
}

impl TelemetryService {
    pub fn new(
        collector: Arc<Collector>,
        sweeper: Arc<RetentionSweeper>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            collector,
            sweeper,
            settings,
            state: Mutex::new(State::Stopped),
        }
    }

    /// Wires a collector and sweeper over `source` and `store` from the loaded config.
    pub fn from_config(
        config: &AppConfig,
        source: Arc<dyn MetricsSource>,
        store: Arc<dyn TelemetryStore>,
    ) -> Self {
        let collector = Collector::new(
            source,
            store.clone(),
            CollectorConfig {
                fetch_timeout: config.collector.fetch_timeout(),
                latency_targets: config.collector.latency_targets.clone(),
            },
        );
        let sweeper = RetentionSweeper::new(store, config.retention.horizon());
        Self::new(
            Arc::new(collector),
            Arc::new(sweeper),
            ServiceSettings {
                sweeper: SweeperConfig {
                    sweep_interval: config.retention.sweep_interval(),
                    vacuum_schedule: config.retention.vacuum_schedule.clone(),
                },
                stats_log_interval: Duration::from_secs(config.collector.stats_log_interval_secs),
            },
        )
    }

    pub fn collector(&self) -> &Arc<Collector> {
        &self.collector
    }

    pub fn sweeper(&self) -> &Arc<RetentionSweeper> {
        &self.sweeper
    }

    /// True from a successful `start` until `stop` begins.
    pub fn is_running(&self) -> bool {
        self.state
            .lock()
            .map(|s| matches!(*s, State::Running(_)))
            .unwrap_or(false)
    }

    /// Starts collection every `tick_interval` plus the retention sweeper. Returns false
    /// without starting anything if already running, still stopping, or any loop period is
    /// zero. Must be called inside a tokio runtime.
    pub fn start(&self, tick_interval: Duration) -> bool {
        let periods = [
            ("tick_interval", tick_interval),
            ("sweep_interval", self.settings.sweeper.sweep_interval),
            ("stats_log_interval", self.settings.stats_log_interval),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| p.is_zero()) {
            warn!(period = *name, "zero loop period; not starting");
            return false;
        }

        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(e) => {
                warn!(error = %e, "lifecycle lock poisoned; not starting");
                return false;
            }
        };
        match *state {
            State::Running(_) => {
                info!("telemetry already running");
                return false;
            }
            State::Stopping => {
                info!("telemetry still stopping; not starting");
                return false;
            }
            State::Stopped => {}
        }

        let (collector_tx, collector_rx) = oneshot::channel();
        let collector_handle = worker::spawn(
            self.collector.clone(),
            WorkerConfig {
                tick_interval,
                stats_log_interval: self.settings.stats_log_interval,
            },
            collector_rx,
        );
        let (sweeper_tx, sweeper_rx) = oneshot::channel();
        let sweeper_handle = retention::spawn(
            self.sweeper.clone(),
            self.settings.sweeper.clone(),
            sweeper_rx,
        );

        *state = State::Running(Running {
            collector_tx,
            collector_handle,
            sweeper_tx,
            sweeper_handle,
        });
        info!(
            tick_interval_ms = tick_interval.as_millis() as u64,
            sweep_interval_ms = self.settings.sweeper.sweep_interval.as_millis() as u64,
            "telemetry started"
        );
        true
    }

    /// Cancels both loops. A cycle or sweep already in flight finishes before this returns,
    /// and `start` is refused until it has. Returns false if nothing was running.
    pub async fn stop(&self) -> bool {
        let running = match self.state.lock() {
            Ok(mut state) => match std::mem::replace(&mut *state, State::Stopping) {
                State::Running(running) => running,
                other => {
                    *state = other;
                    info!("telemetry not running");
                    return false;
                }
            },
            Err(e) => {
                warn!(error = %e, "lifecycle lock poisoned; not stopping");
                return false;
            }
        };
        let _stopping = StoppingGuard(&self.state);

        let _ = running.collector_tx.send(());
        let _ = running.sweeper_tx.send(());
        let (collector, sweeper) = tokio::join!(running.collector_handle, running.sweeper_handle);
        if let Err(e) = collector {
            warn!(error = %e, "collector task ended abnormally");
        }
        if let Err(e) = sweeper {
            warn!(error = %e, "retention task ended abnormally");
        }
        info!("telemetry stopped");
        true
    }
}

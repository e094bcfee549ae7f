//! Public entry point: [`IngestService::start`] connects and spawns the
//! consumption loop and the watchdog; [`IngestService::close`] tears them down.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::connection::ConnectionManager;
use super::consumer::{EMPTY_BODY_BACKOFF, run_consumer};
use super::shutdown::{ShutdownCoordinator, ShutdownSignal};
use super::transport::Transport;
use super::watchdog::{WATCHDOG_INTERVAL, run_watchdog};
use crate::persistence::TorrentStore;
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub watchdog_interval: Duration,
    pub empty_body_backoff: Duration,
    pub shutdown_grace: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            watchdog_interval: WATCHDOG_INTERVAL,
            empty_body_backoff: EMPTY_BODY_BACKOFF,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

pub struct IngestService<T: Transport, S: TorrentStore> {
    manager: Arc<ConnectionManager<T>>,
    store: Arc<S>,
    coordinator: ShutdownCoordinator,
}

impl<T: Transport, S: TorrentStore> IngestService<T, S> {
    /// Connects to the broker and starts both background tasks. A failed
    /// initial connection is returned and nothing is spawned.
    pub async fn start(transport: T, store: S, timings: Timings) -> Result<Self> {
        let coordinator = ShutdownCoordinator::new(ShutdownSignal::new(), timings.shutdown_grace);
        let (manager, inbox) = ConnectionManager::new(transport);
        let manager = Arc::new(manager);

        manager.connect().await?;
        info!(
            queue = %manager.binding().queue,
            consumer_tag = %manager.binding().consumer_tag,
            "Connected to MQ server"
        );

        let store = Arc::new(store);
        let signal = coordinator.signal().clone();

        let watchdog = tokio::spawn(run_watchdog(
            Arc::clone(&manager),
            signal.clone(),
            timings.watchdog_interval,
        ));
        coordinator.track("watchdog", watchdog).await;

        let consumer = tokio::spawn(run_consumer(
            Arc::clone(&manager),
            inbox,
            Arc::clone(&store),
            signal,
            timings.empty_body_backoff,
        ));
        coordinator.track("consumer", consumer).await;

        Ok(Self {
            manager,
            store,
            coordinator,
        })
    }

    /// Stops both tasks, then closes channel, connection and store, stopping
    /// at the first failure. Calling it again repeats the first outcome
    /// without retrying any step.
    pub async fn close(&self) -> Result<()> {
        self.coordinator.teardown(&self.manager, &self.store).await
    }

    pub async fn is_live(&self) -> bool {
        self.manager.is_live().await
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        self.coordinator.signal()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

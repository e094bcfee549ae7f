//! Shutdown coordination.
//!
//! [`ShutdownSignal`] is the broadcast every background task selects on.
//! [`ShutdownCoordinator`] owns it together with the task handles and runs the
//! ordered teardown: signal, join tasks, close channel, close connection,
//! close store. The first failing step ends teardown and is returned.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::connection::ConnectionManager;
use super::transport::Transport;
use crate::persistence::TorrentStore;
use crate::utils::error::{Error, PersistenceError, Result};

/// Idempotent cancellation broadcast.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggering an already triggered signal is a no-op.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has been triggered.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

enum Teardown {
    Pending,
    Done,
    Failed(String),
}

pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
    grace: Duration,
    state: Mutex<Teardown>,
}

impl ShutdownCoordinator {
    pub fn new(signal: ShutdownSignal, grace: Duration) -> Self {
        Self {
            signal,
            tasks: Mutex::new(Vec::new()),
            grace,
            state: Mutex::new(Teardown::Pending),
        }
    }

    pub fn signal(&self) -> &ShutdownSignal {
        &self.signal
    }

    pub async fn track(&self, name: &'static str, task: JoinHandle<()>) {
        self.tasks.lock().await.push((name, task));
    }

    /// Runs teardown once. Later calls return `Ok(())` after a clean
    /// teardown and `Error::Teardown` carrying the first failure otherwise.
    pub async fn teardown<T, S>(&self, manager: &ConnectionManager<T>, store: &Arc<S>) -> Result<()>
    where
        T: Transport,
        S: TorrentStore,
    {
        let mut state = self.state.lock().await;
        match &*state {
            Teardown::Done => return Ok(()),
            Teardown::Failed(reason) => return Err(Error::Teardown(reason.clone())),
            Teardown::Pending => {}
        }

        let outcome = self.run_teardown(manager, store).await;
        *state = match &outcome {
            Ok(()) => Teardown::Done,
            Err(e) => Teardown::Failed(e.to_string()),
        };
        outcome
    }

    async fn run_teardown<T, S>(&self, manager: &ConnectionManager<T>, store: &Arc<S>) -> Result<()>
    where
        T: Transport,
        S: TorrentStore,
    {
        info!("Shutting down ingestion consumer");
        self.signal.trigger();
        self.join_tasks().await;

        manager.close().await?;

        let store = Arc::clone(store);
        tokio::task::spawn_blocking(move || store.close())
            .await
            .map_err(|e| PersistenceError::Task(e.to_string()))??;

        info!("Ingestion consumer stopped");
        Ok(())
    }

    async fn join_tasks(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        let deadline = tokio::time::Instant::now() + self.grace;

        for (name, mut task) in tasks {
            match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("{name} task failed: {e}"),
                Err(_) => {
                    warn!("{name} task did not stop within {:?}, aborting", self.grace);
                    task.abort();
                }
            }
        }
    }
}

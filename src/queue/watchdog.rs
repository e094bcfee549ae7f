//! Reconnection watchdog
//!
//! Every tick, under the connection lock, checks that both the connection and
//! the channel are open and rebuilds them if not. A failed rebuild is simply
//! retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use super::connection::{ConnectionManager, Exclusive};
use super::shutdown::ShutdownSignal;
use super::transport::Transport;

pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(10);

/// Result of one watchdog tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Online,
    Reconnected,
    ReconnectFailed,
}

pub async fn run_watchdog<T: Transport>(
    manager: Arc<ConnectionManager<T>>,
    shutdown: ShutdownSignal,
    period: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let exclusive = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            guard = manager.exclusive() => guard,
        };
        check_connection(exclusive).await;
    }

    info!("Watchdog stopped");
}

pub async fn check_connection<T: Transport>(mut exclusive: Exclusive<'_, T>) -> Health {
    if exclusive.is_live() {
        info!("MQ service is online");
        return Health::Online;
    }

    warn!("MQ connection or channel closed, reconnecting");
    match exclusive.connect().await {
        Ok(()) => {
            info!("Successfully reconnected to MQ server");
            Health::Reconnected
        }
        Err(e) => {
            error!("Automatic reconnection to MQ server failed: {e}");
            Health::ReconnectFailed
        }
    }
}

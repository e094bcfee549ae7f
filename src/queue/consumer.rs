//! Consumption loop
//!
//! Waits on the delivery inbox, then processes each delivery while holding
//! the connection lock:
//! - empty body: pause, then leave the delivery outstanding
//! - undecodable body: nack without requeue (poison message)
//! - store failure: nack with requeue, redelivery paced by the broker
//! - stored: single, non-cumulative ack

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::connection::{ConnectionManager, Inbox};
use super::message::TorrentSummary;
use super::shutdown::ShutdownSignal;
use super::transport::{Delivery, Transport};
use crate::persistence::TorrentStore;
use crate::utils::error::PersistenceError;

/// Pause taken while holding the lock when a delivery has an empty body.
pub const EMPTY_BODY_BACKOFF: Duration = Duration::from_secs(13);

/// Terminal outcome of processing one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Acked,
    /// Rejected without requeue.
    Dropped,
    /// Rejected with requeue.
    Requeued,
    /// Neither acked nor rejected.
    Deferred,
}

pub async fn run_consumer<T, S>(
    manager: Arc<ConnectionManager<T>>,
    mut inbox: Inbox<T::Delivery>,
    store: Arc<S>,
    shutdown: ShutdownSignal,
    empty_body_backoff: Duration,
) where
    T: Transport,
    S: TorrentStore,
{
    info!(queue = %manager.binding().queue, "Consumption loop started");

    loop {
        let delivery = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = inbox.recv() => match next {
                Some(delivery) => delivery,
                None => {
                    warn!("Delivery inbox closed");
                    break;
                }
            },
        };

        let _exclusive = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            guard = manager.exclusive() => guard,
        };

        let disposition =
            process_delivery(&delivery, &store, &shutdown, empty_body_backoff).await;
        debug!(?disposition, "Delivery processed");
    }

    info!("Consumption loop stopped");
}

/// Runs one delivery through decode, store and acknowledgment. The caller is
/// expected to hold the connection lock.
pub async fn process_delivery<D, S>(
    delivery: &D,
    store: &Arc<S>,
    shutdown: &ShutdownSignal,
    empty_body_backoff: Duration,
) -> Disposition
where
    D: Delivery,
    S: TorrentStore,
{
    let body = delivery.body();
    if body.is_empty() {
        warn!("Received a delivery with an empty body, pausing for {empty_body_backoff:?}");
        tokio::select! {
            _ = tokio::time::sleep(empty_body_backoff) => {}
            _ = shutdown.cancelled() => {}
        }
        return Disposition::Deferred;
    }

    let summary = match TorrentSummary::decode(body) {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Dropping undecodable delivery: {e}");
            if let Err(e) = delivery.nack(false, false).await {
                error!("Failed to reject undecodable delivery: {e}");
            }
            return Disposition::Dropped;
        }
    };

    info!(
        info_hash = %summary.info_hash,
        name = %summary.name,
        files = summary.files.len(),
        "Consumed torrent"
    );

    let info_hash = summary.info_hash.clone();
    if let Err(e) = persist(store, summary).await {
        error!("Failed to store torrent {info_hash}: {e}");
        if let Err(e) = delivery.nack(false, true).await {
            error!("Failed to requeue delivery for {info_hash}: {e}");
        }
        return Disposition::Requeued;
    }

    if let Err(e) = delivery.ack(false).await {
        error!("Failed to acknowledge delivery for {info_hash}: {e}");
    }
    Disposition::Acked
}

async fn persist<S: TorrentStore>(
    store: &Arc<S>,
    summary: TorrentSummary,
) -> Result<(), PersistenceError> {
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || {
        store.add_new_torrent(summary.info_hash_bytes(), &summary.name, &summary.files)
    })
    .await
    .map_err(|e| PersistenceError::Task(e.to_string()))?
}

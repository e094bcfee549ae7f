//! Connection manager
//!
//! Owns the broker connection/channel pair and the lock that serializes
//! everything touching it. The lock never leaves this module: callers get an
//! [`Exclusive`] guard that only knows how to probe liveness and rebuild.
//! Holding the guard is also what the consumption loop does while it
//! processes a delivery, so a reconnect and a delivery never overlap.
//!
//! Deliveries are forwarded from the current consumer stream into a single
//! [`Inbox`]. Rebuilding aborts the previous forwarder and installs a new one,
//! so the inbox survives reconnects and the consumption loop can wait on it
//! without holding the lock.

use futures_util::StreamExt;
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::transport::{DeliveryStream, QosPolicy, QueueBinding, Transport};
use crate::utils::error::QueueError;

struct Handle<T: Transport> {
    connection: T::Connection,
    channel: T::Channel,
    pump: JoinHandle<()>,
}

pub struct ConnectionManager<T: Transport> {
    transport: T,
    binding: QueueBinding,
    qos: QosPolicy,
    state: Mutex<Option<Handle<T>>>,
    inbox: mpsc::Sender<T::Delivery>,
}

/// Receiving end of the delivery stream, stable across reconnects.
pub struct Inbox<D> {
    rx: mpsc::Receiver<D>,
}

impl<D> Inbox<D> {
    pub async fn recv(&mut self) -> Option<D> {
        self.rx.recv().await
    }
}

/// Proof of holding the connection lock.
pub struct Exclusive<'a, T: Transport> {
    manager: &'a ConnectionManager<T>,
    state: MutexGuard<'a, Option<Handle<T>>>,
}

impl<T: Transport> ConnectionManager<T> {
    /// Creates a manager for the fixed queue binding and QoS policy. No
    /// connection is made until [`connect`](Self::connect).
    pub fn new(transport: T) -> (Self, Inbox<T::Delivery>) {
        Self::with_binding(transport, QueueBinding::default(), QosPolicy::default())
    }

    pub fn with_binding(
        transport: T,
        binding: QueueBinding,
        qos: QosPolicy,
    ) -> (Self, Inbox<T::Delivery>) {
        // prefetch is 1, so at most one delivery is ever in flight
        let (tx, rx) = mpsc::channel(1);
        let manager = Self {
            transport,
            binding,
            qos,
            state: Mutex::new(None),
            inbox: tx,
        };
        (manager, Inbox { rx })
    }

    pub fn binding(&self) -> &QueueBinding {
        &self.binding
    }

    /// Waits for the connection lock.
    pub async fn exclusive(&self) -> Exclusive<'_, T> {
        Exclusive {
            manager: self,
            state: self.state.lock().await,
        }
    }

    pub async fn connect(&self) -> Result<(), QueueError> {
        self.exclusive().await.connect().await
    }

    pub async fn is_live(&self) -> bool {
        self.exclusive().await.is_live()
    }

    /// Closes the channel, then the connection, stopping at the first failure.
    /// Sides already reported closed are skipped.
    pub async fn close(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let Some(handle) = state.take() else {
            return Ok(());
        };
        handle.pump.abort();

        if self.transport.channel_open(&handle.channel) {
            self.transport.close_channel(&handle.channel).await?;
        } else {
            debug!("Channel already closed");
        }

        if self.transport.connection_open(&handle.connection) {
            self.transport.close_connection(&handle.connection).await?;
        } else {
            debug!("Connection already closed");
        }

        Ok(())
    }

    async fn establish(&self) -> Result<Handle<T>, QueueError> {
        let connection = self.transport.dial().await?;

        match self.open_consumer(&connection).await {
            Ok((channel, stream)) => {
                let pump = tokio::spawn(forward_deliveries(stream, self.inbox.clone()));
                Ok(Handle {
                    connection,
                    channel,
                    pump,
                })
            }
            Err(e) => {
                if let Err(close_err) = self.transport.close_connection(&connection).await {
                    debug!("Failed to close half-open connection: {close_err}");
                }
                Err(e)
            }
        }
    }

    async fn open_consumer(
        &self,
        connection: &T::Connection,
    ) -> Result<(T::Channel, DeliveryStream<T::Delivery>), QueueError> {
        let channel = self.transport.open_channel(connection).await?;
        self.transport.disable_confirms(&channel).await?;
        self.transport.apply_qos(&channel, self.qos).await?;
        let stream = self.transport.consume(&channel, &self.binding).await?;
        Ok((channel, stream))
    }

    async fn retire(&self, previous: Handle<T>) {
        previous.pump.abort();
        if self.transport.connection_open(&previous.connection) {
            if let Err(e) = self.transport.close_connection(&previous.connection).await {
                debug!("Failed to close replaced connection: {e}");
            }
        }
    }
}

impl<T: Transport> Exclusive<'_, T> {
    /// True when both the connection and the channel are open.
    pub fn is_live(&self) -> bool {
        let transport = &self.manager.transport;
        match self.state.as_ref() {
            Some(handle) => {
                transport.connection_open(&handle.connection)
                    && transport.channel_open(&handle.channel)
            }
            None => false,
        }
    }

    /// Dials, opens a channel, applies QoS and registers the consumer. On
    /// failure the previous handle, if any, is left in place.
    pub async fn connect(&mut self) -> Result<(), QueueError> {
        let handle = self.manager.establish().await?;
        if let Some(previous) = self.state.replace(handle) {
            self.manager.retire(previous).await;
        }
        Ok(())
    }
}

async fn forward_deliveries<D: Send + 'static>(
    mut stream: DeliveryStream<D>,
    inbox: mpsc::Sender<D>,
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(delivery) => {
                if inbox.send(delivery).await.is_err() {
                    debug!("Delivery inbox closed");
                    return;
                }
            }
            Err(e) => {
                warn!("Delivery stream failed: {e}");
                return;
            }
        }
    }
    debug!("Delivery stream ended");
}

//! Broker-facing seam.
//!
//! [`Transport`] exposes the individual AMQP steps the connection manager
//! needs, so the manager itself owns their ordering. [`Delivery`] is the
//! envelope handed to the consumption loop.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::utils::error::QueueError;

/// Queue the discovery crawler publishes to.
pub const QUEUE_NAME: &str = "magnetico";
/// Tag this consumer registers under.
pub const CONSUMER_TAG: &str = "storage";

/// Prefetch policy applied to every (re)created channel before consuming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosPolicy {
    pub prefetch_count: u16,
    /// Zero means unbounded.
    pub prefetch_size: u32,
    /// Applies to every consumer on the channel, not only this one.
    pub global: bool,
}

impl Default for QosPolicy {
    fn default() -> Self {
        Self {
            prefetch_count: 1,
            prefetch_size: 0,
            global: true,
        }
    }
}

/// Consumer registration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinding {
    pub queue: String,
    pub consumer_tag: String,
    pub no_ack: bool,
    pub exclusive: bool,
    pub no_local: bool,
    pub no_wait: bool,
}

impl Default for QueueBinding {
    fn default() -> Self {
        Self {
            queue: QUEUE_NAME.to_string(),
            consumer_tag: CONSUMER_TAG.to_string(),
            no_ack: false,
            exclusive: false,
            no_local: false,
            no_wait: false,
        }
    }
}

/// One inbound message. Must be terminated by exactly one `ack` or `nack`.
#[async_trait]
pub trait Delivery: Send + Sync + 'static {
    fn body(&self) -> &[u8];

    async fn ack(&self, multiple: bool) -> Result<(), QueueError>;

    async fn nack(&self, multiple: bool, requeue: bool) -> Result<(), QueueError>;
}

pub type DeliveryStream<D> = BoxStream<'static, Result<D, QueueError>>;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Connection: Send + Sync + 'static;
    type Channel: Send + Sync + 'static;
    type Delivery: Delivery;

    async fn dial(&self) -> Result<Self::Connection, QueueError>;

    async fn open_channel(&self, conn: &Self::Connection) -> Result<Self::Channel, QueueError>;

    /// Leaves publisher confirms off; the channel only consumes.
    async fn disable_confirms(&self, channel: &Self::Channel) -> Result<(), QueueError>;

    async fn apply_qos(&self, channel: &Self::Channel, qos: QosPolicy) -> Result<(), QueueError>;

    async fn consume(
        &self,
        channel: &Self::Channel,
        binding: &QueueBinding,
    ) -> Result<DeliveryStream<Self::Delivery>, QueueError>;

    fn connection_open(&self, conn: &Self::Connection) -> bool;

    fn channel_open(&self, channel: &Self::Channel) -> bool;

    async fn close_channel(&self, channel: &Self::Channel) -> Result<(), QueueError>;

    async fn close_connection(&self, conn: &Self::Connection) -> Result<(), QueueError>;
}

//! `lapin`-backed [`Transport`] for RabbitMQ.

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties};
use tracing::debug;

use super::transport::{Delivery, DeliveryStream, QosPolicy, QueueBinding, Transport};
use crate::utils::error::QueueError;

const REPLY_SUCCESS: u16 = 200;

#[derive(Debug, Clone)]
pub struct AmqpTransport {
    url: String,
}

impl AmqpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

pub struct AmqpDelivery {
    inner: lapin::message::Delivery,
}

impl From<lapin::message::Delivery> for AmqpDelivery {
    fn from(inner: lapin::message::Delivery) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Delivery for AmqpDelivery {
    fn body(&self) -> &[u8] {
        &self.inner.data
    }

    async fn ack(&self, multiple: bool) -> Result<(), QueueError> {
        self.inner
            .acker
            .ack(BasicAckOptions { multiple })
            .await
            .map(|_| ())
            .map_err(QueueError::acknowledgment)
    }

    async fn nack(&self, multiple: bool, requeue: bool) -> Result<(), QueueError> {
        self.inner
            .acker
            .nack(BasicNackOptions { multiple, requeue })
            .await
            .map(|_| ())
            .map_err(QueueError::acknowledgment)
    }
}

#[async_trait]
impl Transport for AmqpTransport {
    type Connection = Connection;
    type Channel = Channel;
    type Delivery = AmqpDelivery;

    async fn dial(&self) -> Result<Connection, QueueError> {
        Connection::connect(&self.url, ConnectionProperties::default())
            .await
            .map_err(|e| QueueError::connectivity("dial", e))
    }

    async fn open_channel(&self, conn: &Connection) -> Result<Channel, QueueError> {
        conn.create_channel()
            .await
            .map_err(|e| QueueError::connectivity("channel", e))
    }

    async fn disable_confirms(&self, channel: &Channel) -> Result<(), QueueError> {
        // lapin channels start with confirms off; only confirm_select turns them on.
        debug!("Channel {} consumes without publisher confirms", channel.id());
        Ok(())
    }

    async fn apply_qos(&self, channel: &Channel, qos: QosPolicy) -> Result<(), QueueError> {
        // basic.qos always goes out with prefetch_size = 0 here.
        channel
            .basic_qos(
                qos.prefetch_count,
                BasicQosOptions { global: qos.global },
            )
            .await
            .map_err(|e| QueueError::connectivity("qos", e))
    }

    async fn consume(
        &self,
        channel: &Channel,
        binding: &QueueBinding,
    ) -> Result<DeliveryStream<AmqpDelivery>, QueueError> {
        let consumer = channel
            .basic_consume(
                &binding.queue,
                &binding.consumer_tag,
                BasicConsumeOptions {
                    no_local: binding.no_local,
                    no_ack: binding.no_ack,
                    exclusive: binding.exclusive,
                    nowait: binding.no_wait,
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| QueueError::connectivity("consume", e))?;

        Ok(consumer
            .map(|item| {
                item.map(AmqpDelivery::from)
                    .map_err(|e| QueueError::connectivity("delivery", e))
            })
            .boxed())
    }

    fn connection_open(&self, conn: &Connection) -> bool {
        conn.status().connected()
    }

    fn channel_open(&self, channel: &Channel) -> bool {
        channel.status().connected()
    }

    async fn close_channel(&self, channel: &Channel) -> Result<(), QueueError> {
        channel
            .close(REPLY_SUCCESS, "consumer shutting down")
            .await
            .map_err(|e| QueueError::close("channel", e))
    }

    async fn close_connection(&self, conn: &Connection) -> Result<(), QueueError> {
        conn.close(REPLY_SUCCESS, "consumer shutting down")
            .await
            .map_err(|e| QueueError::close("connection", e))
    }
}

//! The `queue` module is the ingestion core: it keeps a RabbitMQ consumer
//! alive and turns each delivery into a stored torrent.
//!
//! - `transport`: the broker seam and the fixed binding/QoS values
//! - `amqp`: the `lapin` implementation of that seam
//! - `connection`: the lock-owning connection manager
//! - `consumer`: the delivery processing loop
//! - `watchdog`: periodic liveness check and reconnect
//! - `shutdown`: cancellation signal and ordered teardown
//! - `service`: `start`/`close` wiring of all of the above

pub mod amqp;
pub mod connection;
pub mod consumer;
pub mod message;
pub mod service;
pub mod shutdown;
pub mod transport;
pub mod watchdog;

pub use amqp::AmqpTransport;
pub use connection::{ConnectionManager, Exclusive, Inbox};
pub use consumer::{Disposition, EMPTY_BODY_BACKOFF};
pub use message::TorrentSummary;
pub use service::{IngestService, Timings};
pub use shutdown::ShutdownSignal;
pub use transport::{CONSUMER_TAG, Delivery, QUEUE_NAME, QosPolicy, QueueBinding, Transport};
pub use watchdog::{Health, WATCHDOG_INTERVAL};

//! The `error` module defines the error types used within `magstore`.
//!
//! Each layer has its own enum (`QueueError`, `DecodeError`, `PersistenceError`)
//! and the top-level `Error` wraps them for callers of the public API.

use thiserror::Error;

/// Boxed cause carried by broker-facing errors, independent of the client library.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures talking to the message broker.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Dial, channel setup, QoS or consumer registration failed.
    #[error("broker connectivity failed during {stage}: {source}")]
    Connectivity {
        stage: &'static str,
        #[source]
        source: BoxError,
    },

    /// An ack or nack could not be delivered to the broker.
    #[error("failed to acknowledge delivery: {source}")]
    Acknowledgment {
        #[source]
        source: BoxError,
    },

    /// Closing the channel or connection failed.
    #[error("failed to close {stage}: {source}")]
    Close {
        stage: &'static str,
        #[source]
        source: BoxError,
    },
}

impl QueueError {
    pub fn connectivity(stage: &'static str, source: impl Into<BoxError>) -> Self {
        QueueError::Connectivity {
            stage,
            source: source.into(),
        }
    }

    pub fn acknowledgment(source: impl Into<BoxError>) -> Self {
        QueueError::Acknowledgment {
            source: source.into(),
        }
    }

    pub fn close(stage: &'static str, source: impl Into<BoxError>) -> Self {
        QueueError::Close {
            stage,
            source: source.into(),
        }
    }
}

/// A delivery body that does not match the torrent payload schema.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid torrent payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has an empty infoHash")]
    MissingInfoHash,

    #[error("payload has an empty name")]
    MissingName,

    #[error("file {0:?} has a negative size")]
    NegativeFileSize(String),

    #[error("total file size overflows")]
    TotalSizeOverflow,
}

/// Failures of the persistence backend.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("storage backend error: {0}")]
    Sled(#[from] sled::Error),

    #[error("failed to serialize stored torrent: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid torrent record: {0}")]
    InvalidRecord(&'static str),

    #[error("persistence task failed: {0}")]
    Task(String),
}

/// Top-level error returned by the public API and the binary.
#[derive(Error, Debug)]
pub enum Error {
    /// A previous `close()` stopped at this failure.
    #[error("teardown already failed: {0}")]
    Teardown(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, Error>;

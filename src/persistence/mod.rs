//! The `persistence` module is the durable home of ingested torrents.
//!
//! The consumer only sees the [`TorrentStore`] trait. `sled_store` provides
//! the embedded implementation used by the binary.

pub mod sled_store;

use serde::{Deserialize, Serialize};

use crate::utils::error::PersistenceError;

pub use sled_store::{SledStore, StoredTorrent};

/// One file inside a torrent, as announced by the discovery payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct File {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: i64,
}

/// Durable store for decoded torrent records.
///
/// Implementations are called from the blocking pool, one call at a time.
pub trait TorrentStore: Send + Sync + 'static {
    /// Persists a newly discovered torrent. Storing a torrent that already
    /// exists is not an error.
    fn add_new_torrent(
        &self,
        info_hash: &[u8],
        name: &str,
        files: &[File],
    ) -> Result<(), PersistenceError>;

    /// Flushes and releases the store.
    fn close(&self) -> Result<(), PersistenceError>;
}

#[cfg(test)]
mod tests;

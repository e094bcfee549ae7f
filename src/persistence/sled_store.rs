//! Persistence layer backed by `sled`
//!
//! Torrents live in a single `torrents` tree keyed by their info-hash bytes.
//! Values are JSON-encoded [`StoredTorrent`] records stamped with the time
//! they were first seen. The first writer of a key wins; rediscovering a
//! torrent leaves the stored record untouched.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use tracing::debug;

use super::{File, TorrentStore};
use crate::utils::error::PersistenceError;

const TORRENTS_TREE: &str = "torrents";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredTorrent {
    pub info_hash: String,
    pub name: String,
    pub files: Vec<File>,
    pub total_size: i64,
    pub discovered_on: i64,
}

#[derive(Clone)]
pub struct SledStore {
    db: Db,
    torrents: Tree,
}

impl SledStore {
    /// Open or create a sled database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let db = sled::open(path)?;
        let torrents = db.open_tree(TORRENTS_TREE)?;
        Ok(Self { db, torrents })
    }

    pub fn get_torrent(&self, info_hash: &[u8]) -> Result<Option<StoredTorrent>, PersistenceError> {
        match self.torrents.get(info_hash)? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn torrent_count(&self) -> usize {
        self.torrents.len()
    }
}

impl TorrentStore for SledStore {
    fn add_new_torrent(
        &self,
        info_hash: &[u8],
        name: &str,
        files: &[File],
    ) -> Result<(), PersistenceError> {
        if info_hash.is_empty() {
            return Err(PersistenceError::InvalidRecord("empty info hash"));
        }
        if name.is_empty() {
            return Err(PersistenceError::InvalidRecord("empty name"));
        }

        let record = StoredTorrent {
            info_hash: String::from_utf8_lossy(info_hash).into_owned(),
            name: name.to_string(),
            files: files.to_vec(),
            total_size: total_size(files)?,
            discovered_on: Utc::now().timestamp(),
        };
        let serialized = serde_json::to_vec(&record)?;

        // Insert only if absent.
        match self
            .torrents
            .compare_and_swap(info_hash, None as Option<&[u8]>, Some(serialized))?
        {
            Ok(()) => Ok(()),
            Err(_) => {
                debug!("Torrent {} already stored, skipping", record.info_hash);
                Ok(())
            }
        }
    }

    fn close(&self) -> Result<(), PersistenceError> {
        self.db.flush()?;
        Ok(())
    }
}

fn total_size(files: &[File]) -> Result<i64, PersistenceError> {
    files.iter().try_fold(0i64, |total, file| {
        if file.size < 0 {
            return Err(PersistenceError::InvalidRecord("negative file size"));
        }
        total
            .checked_add(file.size)
            .ok_or(PersistenceError::InvalidRecord("total file size overflows"))
    })
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("db", &"sled::Db")
            .finish()
    }
}

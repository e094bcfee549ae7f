use serde::{Deserialize, Serialize};

use crate::persistence::File;
use crate::utils::error::DecodeError;

/// A torrent announced on the queue.
///
/// Wire form:
///
/// ```json
/// {"infoHash": "AABBCC...", "name": "ubuntu-22.04-iso",
///  "files": [{"path": "ubuntu.iso", "size": 3900000000}]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentSummary {
    pub info_hash: String,
    pub name: String,
    #[serde(default)]
    pub files: Vec<File>,
}

impl TorrentSummary {
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let summary: TorrentSummary = serde_json::from_slice(body)?;
        if summary.info_hash.is_empty() {
            return Err(DecodeError::MissingInfoHash);
        }
        if summary.name.is_empty() {
            return Err(DecodeError::MissingName);
        }
        summary.total_size()?;
        Ok(summary)
    }

    /// Sum of all file sizes. Negative sizes and totals past `i64::MAX` are rejected.
    pub fn total_size(&self) -> Result<i64, DecodeError> {
        self.files.iter().try_fold(0i64, |total, file| {
            if file.size < 0 {
                return Err(DecodeError::NegativeFileSize(file.path.clone()));
            }
            total
                .checked_add(file.size)
                .ok_or(DecodeError::TotalSizeOverflow)
        })
    }

    /// Identifier bytes handed to the store.
    pub fn info_hash_bytes(&self) -> &[u8] {
        self.info_hash.as_bytes()
    }
}

//! # magstore
//!
//! `magstore` drains torrent discovery events from a RabbitMQ queue and
//! stores them in an embedded database, reconnecting on its own when the
//! broker goes away.
//!
//! ## Core Modules
//!
//! - `queue`: connection lifecycle, the consumption loop, the reconnect watchdog and shutdown.
//! - `persistence`: the `TorrentStore` contract and its `sled` implementation.
//! - `config`: loading settings from file and environment.
//! - `utils`: error types and logging setup.

pub mod config;
pub mod persistence;
pub mod queue;
pub mod utils;

pub use utils::error::{Error, Result};

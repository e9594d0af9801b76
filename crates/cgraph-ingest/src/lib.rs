//! The two concrete `Sink` backends (spec §4.8, §6.1-6.2): an online
//! Bolt-protocol graph sink and an offline `bincode`-serialized binary
//! index.

mod offline;
mod online;

pub use offline::{OfflineSink, OfflineSinkConfig};
pub use online::{OnlineSink, OnlineSinkConfig};

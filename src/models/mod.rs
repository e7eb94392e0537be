// src/models/mod.rs

//! Domain models for the dashboard.

mod config;
mod friend;
mod record;

// Re-export all public types
pub use config::{
    Config, LoggingConfig, PathsConfig, PlayerConfig, PublishConfig, RankConfig, RemoteConfig,
};
pub use friend::{Friend, FriendList};
pub use record::{Ledger, LedgerEntry, MapRecord, UNKNOWN_TIME};

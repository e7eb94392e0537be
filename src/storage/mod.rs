//! Storage abstractions for ledger persistence.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! ├── map_records.txt           # The operator's own ledger
//! └── records/                  # One ledger per tracked friend
//!     └── {pid}_records.txt
//! ```

pub mod local;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Ledger;

// Re-export for convenience
pub use local::{LocalStorage, read_ledger, write_ledger};

/// Which ledger an operation refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerKey {
    /// The operator's own ledger
    Own,
    /// A tracked friend's ledger, by pid
    Friend(String),
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerKey::Own => write!(f, "own ledger"),
            LedgerKey::Friend(pid) => write!(f, "friend ledger {pid}"),
        }
    }
}

/// Trait for ledger storage backends.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Load a ledger. A missing ledger is empty, not an error.
    async fn load(&self, key: &LedgerKey) -> Result<Ledger>;

    /// Replace a ledger in full.
    async fn save(&self, key: &LedgerKey, ledger: &Ledger) -> Result<()>;

    /// Whether the ledger has ever been written.
    async fn exists(&self, key: &LedgerKey) -> bool;
}

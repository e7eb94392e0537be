//! Local filesystem storage implementation.
//!
//! Ledgers are rewritten whole through a temp file and a rename, so a crash
//! mid-write leaves the previous ledger intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Ledger, PathsConfig};
use crate::storage::{LedgerKey, LedgerStorage};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    records_file: PathBuf,
    friend_records_dir: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage from explicit locations.
    pub fn new(records_file: impl Into<PathBuf>, friend_records_dir: impl Into<PathBuf>) -> Self {
        Self {
            records_file: records_file.into(),
            friend_records_dir: friend_records_dir.into(),
        }
    }

    /// Create a LocalStorage from the configured paths.
    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self::new(&paths.records_file, &paths.friend_records_dir)
    }

    /// Get the file path for a ledger key.
    pub fn path(&self, key: &LedgerKey) -> PathBuf {
        match key {
            LedgerKey::Own => self.records_file.clone(),
            LedgerKey::Friend(pid) => self.friend_records_dir.join(format!("{pid}_records.txt")),
        }
    }
}

#[async_trait]
impl LedgerStorage for LocalStorage {
    async fn load(&self, key: &LedgerKey) -> Result<Ledger> {
        let path = self.path(key);
        let ledger = read_ledger(&path).await?;
        log::debug!("Loaded {} entries from {}", ledger.len(), path.display());
        Ok(ledger)
    }

    async fn save(&self, key: &LedgerKey, ledger: &Ledger) -> Result<()> {
        let path = self.path(key);
        write_ledger(&path, ledger).await?;
        log::info!("Saved {} entries to {}", ledger.len(), path.display());
        Ok(())
    }

    async fn exists(&self, key: &LedgerKey) -> bool {
        tokio::fs::try_exists(self.path(key)).await.unwrap_or(false)
    }
}

/// Read a ledger file, returning an empty ledger if it doesn't exist.
///
/// A non-empty file with no usable line at all is most likely in an older
/// format, so that case is logged at `warn`.
pub async fn read_ledger(path: &Path) -> Result<Ledger> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Ledger::new()),
        Err(e) => return Err(AppError::Io(e)),
    };

    let (ledger, skipped) = Ledger::parse_counting(&String::from_utf8_lossy(&bytes));
    if ledger.is_empty() && skipped > 0 {
        log::warn!(
            "{}: none of {} lines are name<TAB>time<TAB>rank records, treating as empty",
            path.display(),
            skipped
        );
    }
    Ok(ledger)
}

/// Write a ledger file atomically (write to temp, then rename).
pub async fn write_ledger(path: &Path, ledger: &Ledger) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(ledger.to_tsv().as_bytes()).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

// src/pipeline/sync.rs

//! Sync pipeline: crawl, persist, publish.
//!
//! A run happens on a spawned task so the caller stays responsive. At most
//! one run is in flight per [`SyncRunner`]; the caller keeps a
//! [`SyncHandle`] to watch the phase, cancel, and collect the report.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::{Config, Ledger};
use crate::pipeline::{CancellationToken, CrawlPhase, Outcome, RunContext};
use crate::services::{CrawlReport, Publisher, RecordCrawler, SessionFactory};
use crate::storage::{LedgerKey, LedgerStorage};

/// What happened to the dashboard upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// The webhook accepted the ledger
    Delivered { response: String },
    /// The upload failed; the local ledger was already saved
    Failed { reason: String },
}

/// Result of one sync run.
#[derive(Debug)]
pub enum SyncReport {
    Aborted,
    Completed {
        crawl: CrawlReport,
        publish: PublishStatus,
    },
}

impl SyncReport {
    pub fn is_aborted(&self) -> bool {
        matches!(self, SyncReport::Aborted)
    }
}

/// Runs syncs for the configured player, one at a time.
pub struct SyncRunner {
    config: Arc<Config>,
    crawler: Arc<RecordCrawler>,
    storage: Arc<dyn LedgerStorage>,
    publisher: Arc<dyn Publisher>,
    busy: Arc<AtomicBool>,
}

impl SyncRunner {
    pub fn new(
        config: Arc<Config>,
        sessions: Arc<dyn SessionFactory>,
        storage: Arc<dyn LedgerStorage>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let crawler = Arc::new(RecordCrawler::new(config.remote.clone(), sessions));
        Self {
            config,
            crawler,
            storage,
            publisher,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start a run in the background.
    ///
    /// Fails with [`AppError::Busy`] while another run is in flight. Each
    /// run gets a fresh cancellation token.
    pub fn start(&self) -> Result<SyncHandle> {
        let pid = self.config.require_identity()?.to_string();

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::Busy);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        let ctx = Arc::new(RunContext::new(pid));
        let job = SyncJob {
            ctx: Arc::clone(&ctx),
            crawler: Arc::clone(&self.crawler),
            storage: Arc::clone(&self.storage),
            publisher: Arc::clone(&self.publisher),
            sheet_id: self.config.player.sheet_id.trim().to_string(),
        };

        let task = tokio::spawn(async move {
            let _guard = guard;
            job.run().await
        });

        Ok(SyncHandle { ctx, task })
    }
}

/// Clears the in-flight flag when the run ends, however it ends.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle to a run in flight.
pub struct SyncHandle {
    ctx: Arc<RunContext>,
    task: JoinHandle<Result<SyncReport>>,
}

impl SyncHandle {
    /// Ask the run to stop at its next poll point.
    pub fn cancel(&self) {
        self.ctx.token().cancel();
    }

    /// Token shared with the run, for wiring to an external stop signal.
    pub fn token(&self) -> CancellationToken {
        self.ctx.token().clone()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.ctx.phase()
    }

    pub fn subscribe(&self) -> watch::Receiver<CrawlPhase> {
        self.ctx.subscribe()
    }

    /// Wait for the run to end.
    pub async fn join(self) -> Result<SyncReport> {
        self.task.await?
    }
}

/// Everything one run needs, moved onto the spawned task.
struct SyncJob {
    ctx: Arc<RunContext>,
    crawler: Arc<RecordCrawler>,
    storage: Arc<dyn LedgerStorage>,
    publisher: Arc<dyn Publisher>,
    sheet_id: String,
}

impl SyncJob {
    async fn run(self) -> Result<SyncReport> {
        let ctx = &self.ctx;
        log::info!("Sync started for pid {}", ctx.pid());

        let existing = self.storage.load(&LedgerKey::Own).await?;
        log::info!("Loaded {} known records", existing.len());

        let crawl = match self.crawler.crawl(ctx, &existing).await? {
            Outcome::Finished(report) => report,
            Outcome::Aborted => return Ok(SyncReport::Aborted),
        };
        if ctx.check().is_err() {
            return Ok(self.aborted());
        }

        self.storage.save(&LedgerKey::Own, &crawl.ledger).await?;
        if ctx.check().is_err() {
            return Ok(self.aborted());
        }

        let publish = self.publish(&crawl.ledger).await;
        Ok(SyncReport::Completed { crawl, publish })
    }

    async fn publish(&self, ledger: &Ledger) -> PublishStatus {
        if self.sheet_id.is_empty() {
            let reason = "player.sheet_id is not set".to_string();
            log::error!("Publish skipped: {reason}");
            return PublishStatus::Failed { reason };
        }

        log::info!("Publishing {} records", ledger.len());
        match self.publisher.publish(&ledger.to_tsv(), &self.sheet_id).await {
            Ok(response) => {
                log::info!("Publish response: {response}");
                PublishStatus::Delivered { response }
            }
            Err(e) => {
                log::error!("Publish failed: {e}");
                PublishStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn aborted(&self) -> SyncReport {
        self.ctx.set_phase(CrawlPhase::Aborted);
        self.ctx.token().report_stopped();
        SyncReport::Aborted
    }
}

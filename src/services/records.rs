// src/services/records.rs

//! Record crawler service.
//!
//! A sync crawl runs in three strictly ordered phases:
//!
//! 1. enumerate the profile table and keep rows the ledger doesn't have
//!    current (one session),
//! 2. fetch the player's best time for each candidate, one map at a time
//!    (a second session),
//! 3. merge the results over a copy of the existing ledger.
//!
//! A failed enumeration degrades to "no candidates" and a failed map only
//! loses that map; cancellation stops the crawl at the next poll point.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Ledger, LedgerEntry, MapRecord, RemoteConfig, UNKNOWN_TIME};
use crate::pipeline::{Aborted, CrawlPhase, Outcome, RunContext};
use crate::services::pages;
use crate::services::session::{RemoteSession, SessionFactory};
use crate::utils::url::{map_url, profile_url};

/// How the enumeration phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enumeration {
    /// The profile table was read; `rows` rows were on it
    Complete { rows: usize },
    /// The profile table couldn't be read and no candidates were produced
    Degraded { reason: String },
}

/// Overall verdict of a finished crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    /// Every candidate was fetched
    Done,
    /// Some candidates failed and were left as they were
    PartiallyFailed,
    /// Enumeration failed, so nothing was updated
    EnumerationDegraded,
}

/// A candidate whose detail page couldn't be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub name: String,
    pub reason: String,
}

/// Everything a finished crawl produced.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Existing ledger with this run's results merged in
    pub ledger: Ledger,
    pub enumeration: Enumeration,
    /// Rows that needed a fresh best time
    pub candidates: usize,
    /// Detail pages requested
    pub fetches: usize,
    /// Candidates whose time was found
    pub resolved: Vec<String>,
    /// Candidates with no row for the player; stored as `N/A`
    pub unmatched: Vec<String>,
    /// Candidates left untouched because their page failed
    pub failures: Vec<ItemFailure>,
}

impl CrawlReport {
    pub fn status(&self) -> CrawlStatus {
        if matches!(self.enumeration, Enumeration::Degraded { .. }) {
            CrawlStatus::EnumerationDegraded
        } else if !self.failures.is_empty() {
            CrawlStatus::PartiallyFailed
        } else {
            CrawlStatus::Done
        }
    }
}

pub type CrawlOutcome = Outcome<CrawlReport>;

/// Why a phase stopped early.
#[derive(Debug)]
enum Halt {
    Aborted,
    Failed(AppError),
}

impl From<Aborted> for Halt {
    fn from(_: Aborted) -> Self {
        Halt::Aborted
    }
}

impl From<AppError> for Halt {
    fn from(e: AppError) -> Self {
        Halt::Failed(e)
    }
}

/// Results collected by the fetch phase so far.
#[derive(Debug, Default)]
struct FetchProgress {
    fetches: usize,
    updates: Vec<(String, LedgerEntry)>,
    resolved: Vec<String>,
    unmatched: Vec<String>,
    failures: Vec<ItemFailure>,
}

/// Service for crawling a player's records off the ranking site.
pub struct RecordCrawler {
    remote: RemoteConfig,
    sessions: Arc<dyn SessionFactory>,
}

impl RecordCrawler {
    /// Create a new record crawler over the given sessions.
    pub fn new(remote: RemoteConfig, sessions: Arc<dyn SessionFactory>) -> Self {
        Self { remote, sessions }
    }

    /// Run a full sync crawl for `ctx.pid()` against `existing`.
    ///
    /// `existing` is never modified; the merged ledger comes back in the report.
    pub async fn crawl(&self, ctx: &RunContext, existing: &Ledger) -> Result<CrawlOutcome> {
        if ctx.check().is_err() {
            return Ok(self.aborted(ctx));
        }

        // Phase 1: enumerate changed maps
        ctx.set_phase(CrawlPhase::EnumeratingChanged);
        log::info!("Collecting changed maps for pid {}", ctx.pid());
        let (enumeration, candidates) = match self.enumerate(ctx).await {
            Ok(rows) => {
                let total = rows.len();
                let candidates = existing.merge_candidates(rows);
                log::info!("{} of {} maps need a best time", candidates.len(), total);
                (Enumeration::Complete { rows: total }, candidates)
            }
            Err(Halt::Aborted) => return Ok(self.aborted(ctx)),
            Err(Halt::Failed(e)) => {
                log::warn!("Profile table unavailable, treating as no changes: {e}");
                (
                    Enumeration::Degraded {
                        reason: e.to_string(),
                    },
                    Vec::new(),
                )
            }
        };

        if ctx.check().is_err() {
            return Ok(self.aborted(ctx));
        }

        // Phase 2: fetch best times
        ctx.set_phase(CrawlPhase::FetchingBestTimes);
        let mut progress = FetchProgress::default();
        if !candidates.is_empty() {
            match self.fetch_best_times(ctx, &candidates, &mut progress).await {
                Ok(()) => {}
                Err(Halt::Aborted) => return Ok(self.aborted(ctx)),
                Err(Halt::Failed(e)) => {
                    ctx.set_phase(CrawlPhase::Idle);
                    return Err(e);
                }
            }
        }

        if ctx.check().is_err() {
            return Ok(self.aborted(ctx));
        }

        // Phase 3: merge
        ctx.set_phase(CrawlPhase::Merging);
        let ledger = existing.merged(progress.updates);
        ctx.set_phase(CrawlPhase::Done);

        let report = CrawlReport {
            ledger,
            enumeration,
            candidates: candidates.len(),
            fetches: progress.fetches,
            resolved: progress.resolved,
            unmatched: progress.unmatched,
            failures: progress.failures,
        };
        log::info!(
            "Crawl finished: {} resolved, {} without a record, {} failed",
            report.resolved.len(),
            report.unmatched.len(),
            report.failures.len()
        );
        Ok(Outcome::Finished(report))
    }

    /// Read every map on `ctx.pid()`'s profile, with unknown best times.
    ///
    /// Used for friend ledgers, where only names and ranks matter. Unlike
    /// [`crawl`](Self::crawl), a failed enumeration is an error here.
    pub async fn snapshot(&self, ctx: &RunContext) -> Result<Outcome<Ledger>> {
        if ctx.check().is_err() {
            return Ok(self.aborted(ctx));
        }

        ctx.set_phase(CrawlPhase::EnumeratingChanged);
        let rows = match self.enumerate(ctx).await {
            Ok(rows) => rows,
            Err(Halt::Aborted) => return Ok(self.aborted(ctx)),
            Err(Halt::Failed(e)) => {
                ctx.set_phase(CrawlPhase::Idle);
                return Err(e);
            }
        };

        let ledger: Ledger = rows
            .into_iter()
            .map(|r| (r.name, LedgerEntry::new(UNKNOWN_TIME, r.rank)))
            .collect();
        ctx.set_phase(CrawlPhase::Done);
        log::info!("Snapshot of pid {}: {} maps", ctx.pid(), ledger.len());
        Ok(Outcome::Finished(ledger))
    }

    fn aborted<T>(&self, ctx: &RunContext) -> Outcome<T> {
        ctx.set_phase(CrawlPhase::Aborted);
        ctx.token().report_stopped();
        Outcome::Aborted
    }

    /// Phase 1 in its own session.
    async fn enumerate(&self, ctx: &RunContext) -> std::result::Result<Vec<MapRecord>, Halt> {
        ctx.check()?;
        let mut session = self.sessions.open().await?;
        let result = self.read_profile(session.as_mut(), ctx).await;
        close_session(session).await;
        result
    }

    async fn read_profile(
        &self,
        session: &mut dyn RemoteSession,
        ctx: &RunContext,
    ) -> std::result::Result<Vec<MapRecord>, Halt> {
        let url = profile_url(&self.remote, ctx.pid())?;
        log::debug!("Accessing {url}");

        ctx.check()?;
        session.navigate(&url).await?;
        ctx.check()?;
        session.wait_for_table(self.remote.wait_timeout()).await?;
        ctx.check()?;

        let source = session.page_source().await?;
        Ok(pages::parse_profile_rows(&source)?)
    }

    /// Phase 2 in its own session.
    async fn fetch_best_times(
        &self,
        ctx: &RunContext,
        candidates: &[MapRecord],
        progress: &mut FetchProgress,
    ) -> std::result::Result<(), Halt> {
        ctx.check()?;
        let mut session = self.sessions.open().await?;
        let result = self
            .fetch_each(session.as_mut(), ctx, candidates, progress)
            .await;
        close_session(session).await;
        result
    }

    async fn fetch_each(
        &self,
        session: &mut dyn RemoteSession,
        ctx: &RunContext,
        candidates: &[MapRecord],
        progress: &mut FetchProgress,
    ) -> std::result::Result<(), Halt> {
        for (i, candidate) in candidates.iter().enumerate() {
            ctx.check()?;
            log::debug!(
                "[{}/{}] Fetching best time for {}",
                i + 1,
                candidates.len(),
                candidate.name
            );

            match self.fetch_one(session, ctx, candidate, progress).await {
                Ok(Some(best_time)) => {
                    log::info!(
                        "{}: {} (rank {})",
                        candidate.name,
                        best_time,
                        candidate.rank
                    );
                    progress.resolved.push(candidate.name.clone());
                    progress.updates.push((
                        candidate.name.clone(),
                        LedgerEntry::new(best_time, &candidate.rank),
                    ));
                }
                Ok(None) => {
                    log::warn!("{}: no record for pid {}", candidate.name, ctx.pid());
                    progress.unmatched.push(candidate.name.clone());
                    progress.updates.push((
                        candidate.name.clone(),
                        LedgerEntry::new(UNKNOWN_TIME, &candidate.rank),
                    ));
                }
                Err(Halt::Aborted) => return Err(Halt::Aborted),
                Err(Halt::Failed(e)) => {
                    log::warn!("{}: record not found: {e}", candidate.name);
                    progress.failures.push(ItemFailure {
                        name: candidate.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    async fn fetch_one(
        &self,
        session: &mut dyn RemoteSession,
        ctx: &RunContext,
        candidate: &MapRecord,
        progress: &mut FetchProgress,
    ) -> std::result::Result<Option<String>, Halt> {
        let url = map_url(&self.remote, &candidate.uid)?;

        progress.fetches += 1;
        session.navigate(&url).await?;
        ctx.check()?;
        session.wait_for_table(self.remote.wait_timeout()).await?;
        ctx.check()?;

        match session
            .widen_page_size(&self.remote.page_size_control, self.remote.widen_timeout())
            .await
        {
            Ok(()) => log::debug!("Showing all rows for {}", candidate.name),
            Err(e) => log::info!(
                "Page size control missing for {}, using default pagination: {e}",
                candidate.name
            ),
        }
        ctx.check()?;

        let source = session.page_source().await?;
        Ok(pages::find_player_time(&source, ctx.pid())?)
    }
}

/// Close a session, logging rather than propagating a failure to close.
async fn close_session(mut session: Box<dyn RemoteSession>) {
    if let Err(e) = session.close().await {
        log::warn!("Failed to close remote session: {e}");
    }
}

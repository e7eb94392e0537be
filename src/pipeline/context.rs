//! Per-run state shared between the sync runner and the crawl.

use std::fmt;

use tokio::sync::watch;

use super::cancel::{Aborted, CancellationToken};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Idle,
    EnumeratingChanged,
    FetchingBestTimes,
    Merging,
    Done,
    Aborted,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CrawlPhase::Idle => "idle",
            CrawlPhase::EnumeratingChanged => "enumerating changed maps",
            CrawlPhase::FetchingBestTimes => "fetching best times",
            CrawlPhase::Merging => "merging",
            CrawlPhase::Done => "done",
            CrawlPhase::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Result of a cancellable unit of work.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Ran to the end
    Finished(T),
    /// Stopped by the operator before finishing
    Aborted,
}

impl<T> Outcome<T> {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted)
    }

    pub fn finished(self) -> Option<T> {
        match self {
            Outcome::Finished(value) => Some(value),
            Outcome::Aborted => None,
        }
    }
}

/// Identity, stop flag and phase of one run.
#[derive(Debug)]
pub struct RunContext {
    pid: String,
    cancel: CancellationToken,
    phase: watch::Sender<CrawlPhase>,
}

impl RunContext {
    /// Context for a run on behalf of `pid`, with a fresh stop flag.
    pub fn new(pid: impl Into<String>) -> Self {
        Self::with_token(pid, CancellationToken::new())
    }

    pub fn with_token(pid: impl Into<String>, cancel: CancellationToken) -> Self {
        let (phase, _) = watch::channel(CrawlPhase::Idle);
        Self {
            pid: pid.into(),
            cancel,
            phase,
        }
    }

    /// Player the run crawls for.
    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Poll point for cancellation.
    pub fn check(&self) -> Result<(), Aborted> {
        self.cancel.check()
    }

    pub fn set_phase(&self, phase: CrawlPhase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            log::debug!("Run for pid {}: {previous} -> {phase}", self.pid);
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        *self.phase.borrow()
    }

    /// Watch phase changes from another task.
    pub fn subscribe(&self) -> watch::Receiver<CrawlPhase> {
        self.phase.subscribe()
    }
}

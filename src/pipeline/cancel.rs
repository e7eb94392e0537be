//! Cooperative cancellation for sync runs.
//!
//! A run polls its token at every phase boundary and around every remote
//! call. Nothing is preempted: a navigation already in flight finishes
//! before the abort is observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Marker returned when a run observes a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("run stopped by the operator")]
pub struct Aborted;

#[derive(Debug, Default)]
struct Flags {
    cancelled: AtomicBool,
    stop_reported: AtomicBool,
}

/// Shared stop flag for one run. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flags: Arc<Flags>,
}

impl CancellationToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Only ever goes from false to true.
    pub fn cancel(&self) {
        self.flags.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.cancelled.load(Ordering::SeqCst)
    }

    /// Poll point: `Err(Aborted)` once cancellation has been requested.
    pub fn check(&self) -> Result<(), Aborted> {
        if self.is_cancelled() {
            Err(Aborted)
        } else {
            Ok(())
        }
    }

    /// Emit the operator-facing "stopped" line, at most once per token.
    ///
    /// Returns whether this call was the one that logged it.
    pub fn report_stopped(&self) -> bool {
        let first = !self.flags.stop_reported.swap(true, Ordering::SeqCst);
        if first {
            log::warn!("Sync stopped by the operator");
        }
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.check(), Ok(()));
    }

    #[test]
    fn test_clones_share_the_flag() {
        let token = CancellationToken::new();
        let handle = token.clone();
        handle.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(Aborted));
    }

    #[test]
    fn test_stop_reported_once() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.report_stopped());
        assert!(!token.report_stopped());
        assert!(!token.clone().report_stopped());
    }

    #[test]
    fn test_new_token_resets_state() {
        let old = CancellationToken::new();
        old.cancel();
        old.report_stopped();

        let fresh = CancellationToken::new();
        assert!(!fresh.is_cancelled());
        assert!(fresh.report_stopped());
    }
}

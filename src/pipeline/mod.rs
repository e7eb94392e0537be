//! Pipeline entry points and the pieces every run shares.
//!
//! - `SyncRunner`: crawl, persist and publish the operator's records
//! - `FriendTracker`: friend list, friend ledgers and comparisons
//! - `classify` / `compare`: pure rank and ledger computations

pub mod cancel;
pub mod compare;
pub mod context;
pub mod friends;
pub mod rank;
pub mod sync;

pub use cancel::{Aborted, CancellationToken};
pub use compare::{Comparison, compare};
pub use context::{CrawlPhase, Outcome, RunContext};
pub use friends::FriendTracker;
pub use rank::{ColorSpec, RankSummary, RankTier, badge, classify};
pub use sync::{PublishStatus, SyncHandle, SyncReport, SyncRunner};

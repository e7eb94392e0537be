//! Service layer for the dashboard.
//!
//! This module contains the remote-facing logic for:
//! - Browsing sessions against the ranking site (`RemoteSession`)
//! - Crawling a player's records (`RecordCrawler`)
//! - Publishing a ledger to the dashboard (`WebhookPublisher`)
//! - Resolving player names (`fetch_player_name`)

pub mod pages;
mod profile;
mod publish;
mod records;
pub mod session;

pub use profile::fetch_player_name;
pub use publish::{Publisher, WebhookPublisher};
pub use records::{
    CrawlOutcome, CrawlReport, CrawlStatus, Enumeration, ItemFailure, RecordCrawler,
};
pub use session::{HttpSession, HttpSessionFactory, RemoteSession, SessionFactory};

#[cfg(test)]
pub(crate) use publish::testing as publish_testing;

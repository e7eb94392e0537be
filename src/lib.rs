// src/lib.rs

//! Kackiest Kacky dashboard library.
//!
//! Crawls a player's cleared maps, reconciles them with a local ledger,
//! classifies progress into rank tiers and compares ledgers between players.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

//! Ledger comparison between the operator and a friend.
//!
//! Set differences work on map names only. Rank comparison only considers
//! maps where both ranks parse as integers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::Ledger;

/// Four name lists derived from two ledgers, each sorted by name.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Every map the friend has cleared
    pub friend_maps: Vec<String>,
    /// Cleared by the friend but not by me
    pub only_friend: Vec<String>,
    /// Cleared by me but not by the friend
    pub only_me: Vec<String>,
    /// Cleared by both, where my rank number is higher (worse)
    pub worse_rank: Vec<String>,
}

impl Comparison {
    /// Whether the two ledgers hold exactly the same maps and I am never behind.
    pub fn is_even(&self) -> bool {
        self.only_friend.is_empty() && self.only_me.is_empty() && self.worse_rank.is_empty()
    }
}

/// Compare my ledger against a friend's. Neither ledger is modified.
pub fn compare(mine: &Ledger, friend: &Ledger) -> Comparison {
    let my_maps: BTreeSet<&str> = mine.names().collect();
    let friend_maps: BTreeSet<&str> = friend.names().collect();

    let worse_rank = my_maps
        .intersection(&friend_maps)
        .filter(|name| {
            let my_rank = mine.get(name).and_then(|e| parse_rank(&e.rank));
            let friend_rank = friend.get(name).and_then(|e| parse_rank(&e.rank));
            matches!((my_rank, friend_rank), (Some(m), Some(f)) if m > f)
        })
        .map(|name| name.to_string())
        .collect();

    // BTreeSet iteration is already in name order
    Comparison {
        friend_maps: friend_maps.iter().map(|n| n.to_string()).collect(),
        only_friend: friend_maps
            .difference(&my_maps)
            .map(|n| n.to_string())
            .collect(),
        only_me: my_maps
            .difference(&friend_maps)
            .map(|n| n.to_string())
            .collect(),
        worse_rank,
    }
}

/// Parse a rank cell as an integer; anything else is incomparable.
pub fn parse_rank(rank: &str) -> Option<i64> {
    rank.trim().parse().ok()
}

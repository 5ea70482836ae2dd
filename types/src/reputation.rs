//! Candidate reputation scores.

use serde::{Deserialize, Serialize};

use crate::Address;

/// A candidate's reputation score at a given block.
///
/// Scores are opaque, totally ordered values produced by the reputation
/// oracle; the engine only ever compares them and never interprets their
/// magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reputation {
    pub address: Address,
    pub score: i64,
}

impl Reputation {
    pub fn new(address: Address, score: i64) -> Self {
        Self { address, score }
    }
}

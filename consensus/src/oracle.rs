//! Candidate and reputation oracles.
//!
//! The snapshot engine never talks to the campaign contract directly; it
//! consumes these two narrow traits. A contract-backed implementation
//! lives with the contract caller and is handed in per `apply_headers`
//! call; it is never stored in or serialized with a snapshot. The
//! implementations here cover deployments without a configured contract.

use std::collections::HashMap;

use dpor_types::{Address, Header, Reputation};

use crate::error::OracleError;

/// Source of the campaign roster: the addresses eligible for election at a
/// given header. Must be idempotent per header and must not mutate chain
/// state.
pub trait CandidateSource: Send + Sync {
    fn candidates(&self, header: &Header) -> Result<Vec<Address>, OracleError>;
}

/// Source of reputation scores for a candidate roster at a given header.
/// Must return one score per candidate; must not mutate chain state.
pub trait ReputationSource: Send + Sync {
    fn reputations(
        &self,
        header: &Header,
        candidates: &[Address],
    ) -> Result<Vec<Reputation>, OracleError>;
}

/// Fixed roster used when no campaign contract is configured.
pub struct StaticCandidateSource {
    roster: Vec<Address>,
}

impl StaticCandidateSource {
    pub fn new(roster: Vec<Address>) -> Self {
        Self { roster }
    }
}

impl CandidateSource for StaticCandidateSource {
    fn candidates(&self, _header: &Header) -> Result<Vec<Address>, OracleError> {
        Ok(self.roster.clone())
    }
}

/// Reputation lookup table. Candidates absent from the table score 0.
pub struct TableReputationSource {
    scores: HashMap<Address, i64>,
}

impl TableReputationSource {
    pub fn new(scores: HashMap<Address, i64>) -> Self {
        Self { scores }
    }
}

impl ReputationSource for TableReputationSource {
    fn reputations(
        &self,
        _header: &Header,
        candidates: &[Address],
    ) -> Result<Vec<Reputation>, OracleError> {
        Ok(candidates
            .iter()
            .map(|addr| Reputation::new(*addr, self.scores.get(addr).copied().unwrap_or(0)))
            .collect())
    }
}

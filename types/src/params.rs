//! Consensus engine parameters and term arithmetic.

use serde::{Deserialize, Serialize};

use crate::error::DporError;

/// Number of terms between a committee's election and the start of its
/// mining duty. Elections run while processing block `n` seat the committee
/// that becomes active `TERM_GAP` terms after `n`'s term, giving members
/// time to establish connections and key material before their duty starts.
pub const TERM_GAP: u64 = 3;

/// Tunable parameters of the DPoR engine.
///
/// Configuration is runtime state, not chain state: it is never serialized
/// with a snapshot and is re-injected when a snapshot is loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DporConfig {
    /// Committee size per term.
    pub term_len: u64,
    /// Number of consecutive blocks a single proposer serves before
    /// rotation within a term.
    pub view_len: u64,
    /// Height below which checkpoints install the static seed roster
    /// instead of an election result.
    pub max_init_block_number: u64,
    /// Number of term committees a snapshot retains per role.
    pub max_recent_terms: usize,
}

impl Default for DporConfig {
    fn default() -> Self {
        Self {
            term_len: 4,
            view_len: 3,
            max_init_block_number: 0,
            max_recent_terms: 5,
        }
    }
}

impl DporConfig {
    /// Create a config with the given committee size and view length,
    /// rejecting degenerate values that would break term arithmetic.
    pub fn new(term_len: u64, view_len: u64) -> Result<Self, DporError> {
        let config = Self {
            term_len,
            view_len,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), DporError> {
        if self.term_len == 0 {
            return Err(DporError::InvalidConfig("term_len must be positive".into()));
        }
        if self.view_len == 0 {
            return Err(DporError::InvalidConfig("view_len must be positive".into()));
        }
        if self.max_recent_terms == 0 {
            return Err(DporError::InvalidConfig(
                "max_recent_terms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Number of blocks spanned by one term.
    pub fn blocks_per_term(&self) -> u64 {
        self.term_len * self.view_len
    }

    /// Term index of a block number. The genesis block belongs to term 0.
    pub fn term_of(&self, number: u64) -> u64 {
        if number == 0 {
            0
        } else {
            (number - 1) / self.blocks_per_term()
        }
    }

    /// Term whose committee is elected while processing block `number`.
    pub fn future_term_of(&self, number: u64) -> u64 {
        self.term_of(number) + TERM_GAP
    }

    /// Whether `number` is the first block of a term. Checkpoints are the
    /// only blocks that trigger an election.
    pub fn is_checkpoint(&self, number: u64) -> bool {
        number > 0 && (number - 1) % self.blocks_per_term() == 0
    }

    /// In-turn view slot (0-based) for block `number`, or `None` for the
    /// genesis block, which has no proposer.
    pub fn inturn_view_of(&self, number: u64) -> Option<u64> {
        if number == 0 {
            return None;
        }
        Some(((number - 1) % self.blocks_per_term()) / self.view_len)
    }
}

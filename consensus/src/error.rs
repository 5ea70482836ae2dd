use std::fmt;

use thiserror::Error;

use dpor_store::StoreError;
use dpor_types::{Address, BlockHash};

/// Committee role an address was looked up under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitteeRole {
    Proposer,
    Validator,
    /// Legacy role for snapshots written before the proposer/validator
    /// split; both maps held one committee under this name.
    Signer,
}

impl fmt::Display for CommitteeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitteeRole::Proposer => write!(f, "proposer"),
            CommitteeRole::Validator => write!(f, "validator"),
            CommitteeRole::Signer => write!(f, "signer"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("no candidates to elect from")]
    EmptyInput,

    #[error("insufficient candidates: need {needed}, have {have}")]
    InsufficientCandidates { needed: usize, have: usize },
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid header chain: expected block {expected}, got {got}")]
    InvalidChain { expected: u64, got: u64 },

    #[error("{role} {address} not in committee")]
    NotInCommittee {
        role: CommitteeRole,
        address: Address,
    },

    #[error("genesis block has no leader")]
    GenesisHasNoLeader,

    #[error("no snapshot stored for block {0}")]
    NotFound(BlockHash),

    #[error("corrupt snapshot for block {hash}: {reason}")]
    CorruptSnapshot { hash: BlockHash, reason: String },

    #[error("snapshot serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Election(#[from] ElectionError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

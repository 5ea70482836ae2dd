//! DPoR consensus snapshot engine.
//!
//! Given a sequence of block headers, this crate maintains the
//! authoritative record of who may propose and validate which block at
//! which height: a deterministic seeded election, pluggable candidate and
//! reputation oracles, and the hash-keyed snapshot that carries the
//! committee schedule through terms and views.

pub mod election;
pub mod error;
pub mod oracle;
pub mod snapshot;

pub use election::elect;
pub use error::{CommitteeRole, ElectionError, OracleError, SnapshotError};
pub use oracle::{
    CandidateSource, ReputationSource, StaticCandidateSource, TableReputationSource,
};
pub use snapshot::DporSnapshot;

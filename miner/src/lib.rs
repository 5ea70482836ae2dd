//! Miner-side chain-inclusion tracking.

pub mod unconfirmed;

pub use unconfirmed::{
    ConfirmationReport, HeaderRetriever, UnconfirmedBlocks, UnconfirmedStatus,
};

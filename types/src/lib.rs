//! Fundamental types for the DPoR consensus engine.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: addresses, hashes, the header view consensus reads,
//! reputation scores, and the engine configuration with its term
//! arithmetic.

pub mod address;
pub mod error;
pub mod hash;
pub mod header;
pub mod params;
pub mod reputation;

pub use address::Address;
pub use error::DporError;
pub use hash::BlockHash;
pub use header::Header;
pub use params::{DporConfig, TERM_GAP};
pub use reputation::Reputation;

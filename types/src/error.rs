//! Shared error type for the core types crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DporError {
    #[error("invalid consensus config: {0}")]
    InvalidConfig(String),
}

//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `ArError` as one variant
//! via `#[from]`, so `?` works across crate boundaries.

use thiserror::Error;

use crate::AgentId;

/// The top-level error type for `ar-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum ArError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `ar-*` crates.
pub type ArResult<T> = Result<T, ArError>;

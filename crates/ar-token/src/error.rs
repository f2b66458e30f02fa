use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token configuration error: {0}")]
    Config(String),

    /// Scheduler bookkeeping is inconsistent.  Only produced by
    /// [`TokenScheduler::check_invariants`][crate::TokenScheduler::check_invariants].
    #[error("token invariant violated: {0}")]
    Invariant(String),
}

pub type TokenResult<T> = Result<T, TokenError>;

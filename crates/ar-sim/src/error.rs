use ar_agent::AgentError;
use ar_core::ArError;
use ar_token::TokenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("agent id space exhausted after {0} spawns")]
    IdsExhausted(u32),

    #[error(transparent)]
    Core(#[from] ArError),

    #[error("token scheduler: {0}")]
    Token(#[from] TokenError),

    #[error("agent: {0}")]
    Agent(#[from] AgentError),
}

pub type SimResult<T> = Result<T, SimError>;

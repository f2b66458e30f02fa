use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("priority modifier must be finite and > 0, got {0}")]
    InvalidPriorityModifier(f32),

    #[error("agent configuration error: {0}")]
    Config(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

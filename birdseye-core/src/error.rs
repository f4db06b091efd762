use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("LLM provider failed: {0}")]
    Provider(String),
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Transport failed: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),
    #[error("Operation was cancelled")]
    Cancelled,
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl ModelError {
    pub fn transport<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        ModelError::Transport(Box::new(err))
    }
}

//! Engine error types.

use thiserror::Error;

use remux_media::MediaError;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced synchronously from the orchestrator.
///
/// Errors raised on a task's execution path never appear here; they are
/// captured into the task record as the terminal Failed state.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

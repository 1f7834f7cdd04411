//! Engine error taxonomy.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures surfaced by the cipher engine and file pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller-side rejection: empty or too-short key, unusable paths.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying filesystem failure; aborts the current file only.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Integrity tag mismatch on decrypt. The destination file has
    /// already been removed when this surfaces.
    #[error("wrong key: integrity tag mismatch")]
    WrongKey,

    /// Broken internal bookkeeping (chunk protocol violation). Not
    /// user-recoverable.
    #[error("corrupt pipeline state: {0}")]
    Corrupt(String),
}

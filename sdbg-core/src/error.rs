//! Error types for the debug execution engine.

use thiserror::Error;

use crate::controller::ThreadId;

/// Taxonomy of failures the engine can report to a caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown thread: {thread_id}")]
    UnknownThread { thread_id: ThreadId },

    #[error("thread {thread_id} is not suspended")]
    NotSuspended { thread_id: ThreadId },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("evaluation failed: {message}")]
    EvaluationFailure { message: String },

    #[error("transport failure: {message}")]
    TransportFailure { message: String },

    #[error("session fatal error: {message}")]
    SessionFatal { message: String },
}

/// Convenience `Result` alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

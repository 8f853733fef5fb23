//! Error types for Stock core.

use thiserror::Error;

/// Worker pool errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadPoolError {
    /// A pool was configured with zero worker threads.
    #[error("Worker pool requires at least one thread")]
    NoWorkers,
    /// The operating system refused to create a worker thread.
    #[error("Failed to spawn worker thread: {0}")]
    SpawnFailed(String),
    /// The pool has been disposed and no longer accepts jobs.
    #[error("Worker pool has been disposed")]
    Disposed,
}

/// A specialized Result type for Stock core operations.
pub type Result<T> = std::result::Result<T, ThreadPoolError>;

//! Error types for the networking module.

use thiserror::Error;

/// Transport-level errors.
///
/// These never cross the session boundary as `Err`: the session worker folds
/// them into the [`Response`](crate::Response) handed to the callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),
    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Request timed out.
    #[error("Request timed out")]
    Timeout,
    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
    /// The transfer was aborted because its cancellation flag was raised.
    #[error("Request was cancelled")]
    Cancelled,
    /// HTTP error status (anything outside 2xx).
    #[error("HTTP {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },
    /// The async runtime backing a transport could not be created.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl NetworkError {
    /// Whether this error is the distinguished abort outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors raised while constructing a [`Session`](crate::Session).
///
/// These are the only fatal conditions of the session; everything that goes
/// wrong with an individual request is reported through its callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session was configured with zero workers.
    #[error("Session requires at least one worker thread")]
    InvalidWorkerCount,
    /// A worker thread could not be spawned.
    #[error("Failed to spawn session worker: {0}")]
    ThreadSpawn(String),
    /// The default transport could not be created.
    #[error("Failed to create transport: {0}")]
    Transport(#[from] NetworkError),
    /// The configuration could not be parsed.
    #[error("Invalid session configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// A specialized Result type for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

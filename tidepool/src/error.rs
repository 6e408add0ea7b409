//! Error types for reactor and connection operations.

use std::io;
use thiserror::Error;

/// Errors that can occur while driving the reactor.
#[derive(Error, Debug, Clone)]
pub enum ReactorError {
    /// The readiness-wait primitive itself failed and the fault cannot be
    /// attributed to a single descriptor.
    #[error("readiness wait failed with {descriptors} descriptors registered: {message}")]
    WaitFailed {
        /// Number of descriptors that were registered for the wait.
        descriptors: usize,
        /// Stringified error reported by the wait primitive.
        message: String,
    },

    /// A factory could not build a connection, or the connection refused to
    /// start, while registering it with the reactor.
    #[error("connection setup failed: {0}")]
    ConnectionSetup(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<io::Error> for ReactorError {
    fn from(error: io::Error) -> Self {
        ReactorError::Io(error.to_string())
    }
}

impl From<ConnectionError> for ReactorError {
    fn from(error: ConnectionError) -> Self {
        ReactorError::ConnectionSetup(error.to_string())
    }
}

/// Result type for reactor operations.
pub type ReactorResult<T> = Result<T, ReactorError>;

/// Errors that can occur during connection contract operations.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// The connection has been stopped and accepts no further operations.
    #[error("connection is stopped")]
    Stopped,

    /// Reconnection gave up after exhausting the configured retry budget.
    #[error("reconnection abandoned after {attempts} attempts")]
    RetriesExhausted {
        /// Number of consecutive attempts made before giving up.
        attempts: u32,
    },

    /// The factory does not support building listening connections.
    #[error("factory does not support listening sockets")]
    ListenUnsupported,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<io::Error> for ConnectionError {
    fn from(error: io::Error) -> Self {
        ConnectionError::Io(error.to_string())
    }
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

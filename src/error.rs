//! Error types for the resilience layer.
//!
//! The sentinel variants mirror the ones PostgreSQL drivers expose so that
//! callers can match on them without depending on a particular driver.

use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Phrase reported by the OS when the remote peer resets a TCP connection.
pub const CONNECTION_RESET_PHRASE: &str = "connection reset by peer";

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Unexpected data received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError(pub String);

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ProtocolError {}

#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Rows were expected but none were returned.
    #[error("no rows in result set")]
    NoRows,

    /// Waiting for a notification timed out.
    #[error("notification timeout")]
    NotificationTimeout,

    /// An attempt was made to use a dead connection.
    #[error("connection is dead")]
    DeadConn,

    /// TLS was required but the server refused it.
    #[error("server refused TLS connection")]
    TlsRefused,

    /// The connection is busy, e.g. in the middle of reading results.
    #[error("conn is busy")]
    ConnBusy,

    /// An invalid log level was requested.
    #[error("invalid log level")]
    InvalidLogLevel,

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// Server returned an error response.
    #[error("{severity}: {message} ({code})")]
    Server {
        severity: String,
        code: String,
        message: String,
        detail: Option<String>,
        hint: Option<String>,
    },

    #[error("type conversion error: {0}")]
    Type(String),

    /// Any other driver-reported failure.
    #[error("{0}")]
    Driver(String),

    /// The liveness probe returned something other than the expected value.
    #[error("ping failed: {0}")]
    Ping(String),

    #[error("scan expected {expected} destinations, row has {got} columns")]
    ColumnCount { expected: usize, got: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("pool is closed")]
    PoolClosed,
}

impl Error {
    /// Whether the error means the pooled connection died underneath us.
    ///
    /// True for the dead-connection sentinel, for I/O resets, and for any
    /// error whose message ends with the peer-reset phrase.
    pub fn is_dead_connection(&self) -> bool {
        self.is_dead_connection_with(CONNECTION_RESET_PHRASE)
    }

    /// Same as [`Error::is_dead_connection`] with a custom reset phrase.
    pub fn is_dead_connection_with(&self, reset_phrase: &str) -> bool {
        match self {
            Error::DeadConn => true,
            Error::Io(e) if e.kind() == io::ErrorKind::ConnectionReset => true,
            _ => {
                let phrase = reset_phrase.to_ascii_lowercase();
                !phrase.is_empty() && self.to_string().to_ascii_lowercase().ends_with(&phrase)
            }
        }
    }

    /// Whether this is the no-rows sentinel.
    #[inline]
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Error::NoRows)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

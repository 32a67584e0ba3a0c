//! Error types for tpf-core
//!
//! Every error that can be detected synchronously is reported through the
//! same channel an asynchronous error of the same kind would use: the error
//! callback for query admission, the result stream for backend execution,
//! and the byte stream (or the datasource-level error channel) for fetches.
//! Nothing in this crate panics on a query path.

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
///
/// `Clone` is deliberate: the same error may be delivered both in-band on a
/// stream and to an attached error callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A query was issued before the datasource reached the ready state
    #[error("the datasource is not initialized yet")]
    NotInitialized,

    /// The datasource does not expose the features the query requires
    #[error("the datasource does not support the given query")]
    UnsupportedQuery,

    /// A caller defect, such as navigating a range-gate query into a leaf
    #[error("usage error: {0}")]
    Usage(String),

    /// Backend-specific setup failed; the datasource is permanently unusable
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// A fetch locator used a scheme the contract cannot resolve
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    /// An HTTP fetch answered with a non-success status
    #[error("{url} returned {status}")]
    HttpStatus { url: String, status: u16 },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Backend-specific query execution failed
    #[error("backend error: {0}")]
    Backend(String),

    /// The consumer of a stream went away before production finished
    #[error("the stream consumer has been dropped")]
    StreamClosed,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a usage error
    pub fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }

    /// Create an initialization error
    pub fn initialization(msg: impl Into<String>) -> Self {
        Error::Initialization(msg.into())
    }

    /// Create an I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }

    /// Create a backend execution error
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

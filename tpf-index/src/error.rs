//! Error types for index operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// A caller defect: navigation reached a node of the wrong kind.
    /// Fatal and never retried.
    #[error("invalid navigation: {0}")]
    Usage(String),

    /// The tree being built violates a structural invariant
    #[error("invalid index structure: {0}")]
    Structure(String),
}

impl IndexError {
    /// Create a usage error
    pub fn usage(msg: impl Into<String>) -> Self {
        IndexError::Usage(msg.into())
    }

    /// Create a structure error
    pub fn structure(msg: impl Into<String>) -> Self {
        IndexError::Structure(msg.into())
    }
}

impl From<IndexError> for tpf_core::Error {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Usage(msg) => tpf_core::Error::Usage(msg),
            IndexError::Structure(msg) => tpf_core::Error::Other(msg),
        }
    }
}

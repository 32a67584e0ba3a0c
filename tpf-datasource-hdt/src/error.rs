//! Error types for HDT document access

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HdtError>;

#[derive(Error, Debug, Clone)]
pub enum HdtError {
    /// The document could not be opened
    #[error("cannot open HDT document {path}: {reason}")]
    Open { path: String, reason: String },

    /// A pattern search inside the document failed
    #[error("HDT search failed: {0}")]
    Search(String),

    /// The document was used after being closed
    #[error("the HDT document is closed")]
    Closed,
}

impl From<HdtError> for tpf_core::Error {
    fn from(err: HdtError) -> Self {
        match err {
            HdtError::Open { .. } => tpf_core::Error::initialization(err.to_string()),
            other => tpf_core::Error::backend(other.to_string()),
        }
    }
}

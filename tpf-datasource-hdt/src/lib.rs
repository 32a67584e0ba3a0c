//! # TPF HDT datasource
//!
//! Datasource backend family over compressed binary (HDT) documents. The
//! format's own search machinery is used as an opaque capability through
//! the [`HdtDocument`] trait; this crate contributes document lifecycle,
//! the triples-only graph rule, and the total-count floor.

pub mod datasource;
pub mod document;
pub mod error;
pub mod mock;

// Re-export main types
pub use datasource::HdtBackend;
pub use document::{HdtDocument, HdtLoader, SearchResult};
pub use error::{HdtError, Result};
pub use mock::{MockHdtDocument, MockHdtLoader};

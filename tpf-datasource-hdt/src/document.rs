//! The opaque HDT document capability
//!
//! The compressed binary format's own search machinery is not modeled
//! here; a document is used purely through its search capability:
//! `search(pattern, limit, offset)` yields a page of quads plus a total
//! match count that may be an estimate.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tpf_core::{Quad, QuadPattern};

/// One page of search results from a document
#[derive(Clone, Debug, Default)]
pub struct SearchResult {
    /// The matching quads of the requested page
    pub quads: Vec<Quad>,
    /// Total number of matches ignoring limit and offset
    pub total_count: u64,
    /// Whether `total_count` is exact rather than an estimate
    pub exact: bool,
}

/// A loaded compressed-binary document
///
/// Implementations must tolerate concurrent `search` calls or serialize
/// internally; the datasource contract imposes no locking.
#[async_trait]
pub trait HdtDocument: Send + Sync {
    /// Search the document for a pattern page
    async fn search(
        &self,
        pattern: &QuadPattern,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<SearchResult>;

    /// Release the document's resources
    async fn close(&self) -> Result<()>;
}

/// Opens documents from the filesystem
///
/// Splitting the loader from the document keeps the format library fully
/// opaque: production wires in the real reader, tests wire in a mock.
#[async_trait]
pub trait HdtLoader: Send + Sync {
    async fn open(&self, path: &Path) -> Result<Arc<dyn HdtDocument>>;
}

//! In-memory stand-ins for the opaque format library
//!
//! Used by this crate's tests and by downstream crates that need an HDT
//! datasource without a real document on disk.

use crate::document::{HdtDocument, HdtLoader, SearchResult};
use crate::error::{HdtError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tpf_core::{Quad, QuadPattern};

/// Document over an in-memory quad list
#[derive(Debug, Default)]
pub struct MockHdtDocument {
    quads: Vec<Quad>,
    /// When set, `search` reports this estimate instead of the real count
    reported_estimate: Option<u64>,
    close_count: AtomicUsize,
}

impl MockHdtDocument {
    /// Create a document over the given quads, reporting exact counts
    pub fn new(quads: Vec<Quad>) -> Self {
        Self {
            quads,
            reported_estimate: None,
            close_count: AtomicUsize::new(0),
        }
    }

    /// Report a fixed (possibly under-reporting) inexact estimate
    pub fn with_estimate(mut self, estimate: u64) -> Self {
        self.reported_estimate = Some(estimate);
        self
    }

    /// How many times the document was closed
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HdtDocument for MockHdtDocument {
    async fn search(
        &self,
        pattern: &QuadPattern,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<SearchResult> {
        let matches: Vec<&Quad> = self.quads.iter().filter(|q| pattern.matches(q)).collect();
        let (total_count, exact) = match self.reported_estimate {
            Some(estimate) => (estimate, false),
            None => (matches.len() as u64, true),
        };
        let quads = matches
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(SearchResult {
            quads,
            total_count,
            exact,
        })
    }

    async fn close(&self) -> Result<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Loader handing out one prepared document
pub struct MockHdtLoader {
    document: Arc<MockHdtDocument>,
    fail_with: Option<String>,
    delay: Option<std::time::Duration>,
}

impl MockHdtLoader {
    /// A loader that opens the given document
    pub fn new(document: Arc<MockHdtDocument>) -> Self {
        Self {
            document,
            fail_with: None,
            delay: None,
        }
    }

    /// A loader whose `open` always fails
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            document: Arc::new(MockHdtDocument::default()),
            fail_with: Some(reason.into()),
            delay: None,
        }
    }

    /// Delay `open`, to exercise close-during-initialization paths
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl HdtLoader for MockHdtLoader {
    async fn open(&self, path: &Path) -> Result<Arc<dyn HdtDocument>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.fail_with {
            return Err(HdtError::Open {
                path: path.display().to_string(),
                reason: reason.clone(),
            });
        }
        Ok(Arc::clone(&self.document) as Arc<dyn HdtDocument>)
    }
}

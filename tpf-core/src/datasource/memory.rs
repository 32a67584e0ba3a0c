//! In-memory quad backend
//!
//! Holds a plain list of quads and answers pattern queries with exact
//! counts. Useful on its own for small datasets and as the reference
//! backend for the contract's end-to-end tests.

use super::Backend;
use crate::error::Result;
use crate::query::{features, Query};
use crate::quad::Quad;
use crate::stream::{Metadata, Sink};
use async_trait::async_trait;

const MEMORY_FEATURES: &[&str] = &[
    features::TRIPLE_PATTERN,
    features::QUAD_PATTERN,
    features::LIMIT,
    features::OFFSET,
    features::TOTAL_COUNT,
];

/// Backend over an in-memory list of quads
#[derive(Debug, Default)]
pub struct MemoryBackend {
    quads: Vec<Quad>,
}

impl MemoryBackend {
    /// Create a backend over the given quads
    pub fn new(quads: Vec<Quad>) -> Self {
        Self { quads }
    }

    /// Number of stored quads
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// Whether the backend holds no quads
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn features(&self) -> &[&str] {
        MEMORY_FEATURES
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, query: Query, destination: Sink<Quad>) -> Result<()> {
        let pattern = query.pattern();
        let matches: Vec<&Quad> = self.quads.iter().filter(|q| pattern.matches(q)).collect();
        destination
            .set_metadata(Metadata {
                total_count: matches.len() as u64,
                exact: true,
            })
            .await?;

        let page = matches
            .into_iter()
            .skip(query.effective_offset())
            .take(query.limit.unwrap_or(usize::MAX));
        for quad in page {
            destination.push(quad.clone()).await?;
        }
        destination.close().await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream;
    use crate::term::Term;

    fn quads(n: usize) -> Vec<Quad> {
        (0..n)
            .map(|i| {
                Quad::triple(
                    Term::iri(format!("http://example.org/s{i}")),
                    Term::iri("http://example.org/p"),
                    Term::literal(format!("{i}")),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn reports_exact_count_and_pages() {
        let backend = MemoryBackend::new(quads(20));
        let (sink, stream) = stream::channel(8);
        let query = Query::new().with_offset(5).with_limit(3);
        backend.execute(query, sink).await.unwrap();

        let (items, metadata) = stream.collect().await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].subject, Term::iri("http://example.org/s5"));
        assert_eq!(
            metadata,
            Some(Metadata {
                total_count: 20,
                exact: true
            })
        );
    }

    #[tokio::test]
    async fn filters_by_pattern() {
        let backend = MemoryBackend::new(quads(10));
        let (sink, stream) = stream::channel(8);
        let query = Query::new().with_subject(Term::iri("http://example.org/s7"));
        backend.execute(query, sink).await.unwrap();

        let (items, metadata) = stream.collect().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(metadata.map(|m| m.total_count), Some(1));
    }
}

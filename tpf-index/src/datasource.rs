//! Index-backed datasource backend
//!
//! Serves one navigation point of a [`MemoryIndex`] through the datasource
//! contract. The navigation path is fixed at construction: routing
//! collaborators create one backend per navigable fragment, while the tree
//! itself is shared between all of them.

use crate::error::Result;
use crate::key::IndexKey;
use crate::memory::{MemoryIndex, RangeGateStream};
use async_trait::async_trait;
use tpf_core::{features, Backend, Quad, Query, Sink};

const INDEX_FEATURES: &[&str] = &[
    features::TRIPLE_PATTERN,
    features::QUAD_PATTERN,
    features::LIMIT,
    features::OFFSET,
    features::TOTAL_COUNT,
    features::RANGE_GATES,
];

/// Backend over a navigation point of an in-memory index
#[derive(Clone, Debug)]
pub struct IndexBackend {
    index: MemoryIndex,
    navigation: Vec<IndexKey>,
}

impl IndexBackend {
    /// Create a backend pinned to the given navigation path
    pub fn new(index: MemoryIndex, navigation: Vec<IndexKey>) -> Self {
        Self { index, navigation }
    }

    /// The shared index
    pub fn index(&self) -> &MemoryIndex {
        &self.index
    }

    /// Enumerate sub-range boundaries under this backend's navigation point
    ///
    /// See [`MemoryIndex::query_range_gates`].
    pub fn range_gates(
        &self,
        lower: &IndexKey,
        upper: &IndexKey,
        gate_base: &str,
    ) -> Result<RangeGateStream> {
        self.index
            .query_range_gates(lower, upper, &self.navigation, gate_base)
    }
}

#[async_trait]
impl Backend for IndexBackend {
    fn features(&self) -> &[&str] {
        INDEX_FEATURES
    }

    async fn initialize(&self) -> tpf_core::Result<()> {
        // the tree was built by the owning process at load time
        Ok(())
    }

    async fn execute(&self, query: Query, destination: Sink<Quad>) -> tpf_core::Result<()> {
        self.index
            .stream_resources(&query, &self.navigation, destination)
            .await
    }

    async fn close(&self) -> tpf_core::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{IndexNode, KeyRange};
    use std::sync::Arc;
    use tpf_core::{Datasource, DatasourceOptions, Error, LifecycleState, Term};

    fn quad(n: usize) -> Quad {
        Quad::triple(
            Term::iri(format!("s{n}")),
            Term::iri("p"),
            Term::literal(format!("{n}")),
        )
    }

    fn index() -> MemoryIndex {
        MemoryIndex::new(
            IndexNode::inner(vec![
                KeyRange::new(0, 10, IndexNode::leaf(vec![quad(0), quad(1)])).unwrap(),
                KeyRange::new(10, 20, IndexNode::leaf(vec![quad(2)])).unwrap(),
            ])
            .unwrap(),
        )
    }

    async fn ready(ds: &Datasource) {
        ds.initialize();
        assert_eq!(ds.settled().await, LifecycleState::Ready);
    }

    #[tokio::test]
    async fn serves_a_leaf_fragment_through_the_contract() {
        let backend = IndexBackend::new(index(), vec![IndexKey::from(0)]);
        let ds = Datasource::new(DatasourceOptions::with_path("index"), Arc::new(backend));
        ready(&ds).await;

        let stream = ds.select(&Query::new(), None).unwrap();
        let (quads, metadata) = stream.collect().await.unwrap();
        assert_eq!(quads, vec![quad(0), quad(1)]);
        assert_eq!(metadata.map(|m| m.total_count), Some(2));
    }

    #[tokio::test]
    async fn usage_error_surfaces_on_the_result_stream() {
        // a reduced index with an inner-node navigation path is a caller
        // defect; through the contract it must close the stream with an
        // error rather than return a truncated result
        let backend = IndexBackend::new(
            MemoryIndex::reduced(index().root().clone()),
            vec![],
        );
        let ds = Datasource::new(DatasourceOptions::with_path("reduced"), Arc::new(backend));
        ready(&ds).await;

        let mut stream = ds.select(&Query::new(), None).unwrap();
        match stream.next().await {
            Some(Err(Error::Usage(_))) => {}
            other => panic!("expected usage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exposes_range_gates_for_navigation() {
        let backend = IndexBackend::new(index(), vec![]);
        let gates = backend
            .range_gates(&IndexKey::from(0), &IndexKey::from(20), "b#")
            .unwrap();
        let (gates, _) = gates.collect().await.unwrap();
        assert_eq!(gates.len(), 2);
        assert_eq!(gates[0].id, "b#range-0");
    }
}

//! The in-memory multidimensional index
//!
//! A [`MemoryIndex`] answers two distinct query shapes against the node
//! tree:
//!
//! - **Range-gate queries** enumerate the sub-range boundaries an inner
//!   node holds within a key window. They are cheap and bounded, letting a
//!   client discover how to page through a dimension without materializing
//!   any resources.
//! - **Dimensional-resource queries** stream the quads reachable from a
//!   navigation point, filtered and paginated; potentially large, hence
//!   backpressured.
//!
//! A *reduced* index was built in a lossy, aggregated mode: inner nodes no
//! longer carry enough detail to answer resource queries, so only leaf
//! navigation paths are valid for resources there.
//!
//! Navigating a range-gate query into a leaf, or a resource query into an
//! inner node of a reduced index, is a defect in the calling navigation
//! logic: both fail fast with a usage error and produce nothing.

use crate::error::{IndexError, Result};
use crate::key::IndexKey;
use crate::node::IndexNode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tpf_core::stream::{self, EventStream, Metadata, Sink};
use tpf_core::{Quad, Query};
use tracing::debug;

/// One sub-range boundary descriptor
///
/// `id` is unique within its stream, built from a stream-local ordinal; it
/// carries no ordering guarantee across separate calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeGate {
    pub id: String,
    #[serde(rename = "initial")]
    pub lower: IndexKey,
    #[serde(rename = "final")]
    pub upper: IndexKey,
}

/// A stream of range-gate descriptors
pub type RangeGateStream = EventStream<RangeGate>;

/// Read-only view over an index node tree
///
/// Cheap to clone; the tree itself is shared.
#[derive(Clone, Debug)]
pub struct MemoryIndex {
    root: Arc<IndexNode>,
    reduced: bool,
}

impl MemoryIndex {
    /// Create an index over a fully detailed tree
    pub fn new(root: IndexNode) -> Self {
        Self {
            root: Arc::new(root),
            reduced: false,
        }
    }

    /// Create an index over a tree built in reduced (lossy) mode
    pub fn reduced(root: IndexNode) -> Self {
        Self {
            root: Arc::new(root),
            reduced: true,
        }
    }

    /// Whether this index only answers leaf-level resource queries
    pub fn is_reduced(&self) -> bool {
        self.reduced
    }

    /// The root of the node tree
    pub fn root(&self) -> &IndexNode {
        &self.root
    }

    /// Enumerate the sub-range boundaries within `[lower, upper)` held by
    /// the inner node at the given navigation path
    ///
    /// Resolving a leaf is a fatal usage error: no stream is created and
    /// zero descriptors are emitted. Otherwise the stream ends with a clean
    /// end signal whether or not any descriptor was produced.
    pub fn query_range_gates(
        &self,
        lower: &IndexKey,
        upper: &IndexKey,
        path: &[IndexKey],
        gate_base: &str,
    ) -> Result<RangeGateStream> {
        let node = self.root.navigate(path)?;
        let inner = match node {
            IndexNode::Leaf(_) => {
                return Err(IndexError::usage(
                    "tried to get range gates from a leaf index node",
                ));
            }
            IndexNode::Inner(inner) => inner,
        };

        let gates: Vec<RangeGate> = inner
            .ranges()
            .iter()
            .filter(|r| r.intersects(lower, upper))
            .enumerate()
            .map(|(ordinal, r)| RangeGate {
                id: format!("{gate_base}range-{ordinal}"),
                lower: r.lower.clone(),
                upper: r.upper.clone(),
            })
            .collect();
        debug!(gates = gates.len(), %lower, %upper, "answering range-gate query");

        let (sink, gate_stream) = stream::channel(stream::DEFAULT_CAPACITY);
        tokio::spawn(async move {
            for gate in gates {
                if sink.push(gate).await.is_err() {
                    return;
                }
            }
            let _ = sink.close().await;
        });
        Ok(gate_stream)
    }

    /// Stream the resources at the given navigation path
    ///
    /// Fail-fast validation happens before the stream exists, so a usage
    /// error emits zero quads.
    pub fn query_dimensional_resources(
        &self,
        query: &Query,
        path: &[IndexKey],
    ) -> Result<EventStream<Quad>> {
        self.validate_resource_path(path)?;
        let (sink, quad_stream) = stream::channel(stream::DEFAULT_CAPACITY);
        let index = self.clone();
        let query = query.clone();
        let path = path.to_vec();
        tokio::spawn(async move {
            // validation already passed; a failure here would be a race
            // against tree mutation, which the read-only tree rules out
            if let Err(error) = index.stream_resources(&query, &path, sink.clone()).await {
                let _ = sink.fail(error).await;
            }
        });
        Ok(quad_stream)
    }

    /// Produce the resources at `path` into an existing destination
    ///
    /// This is the execution step used by the index-backed datasource: a
    /// returned error is the caller's to redirect onto its error channel.
    pub async fn stream_resources(
        &self,
        query: &Query,
        path: &[IndexKey],
        destination: Sink<Quad>,
    ) -> tpf_core::Result<()> {
        self.validate_resource_path(path)?;
        let node = self.root.navigate(path)?;
        let pattern = query.pattern();
        destination
            .set_metadata(Metadata {
                total_count: node.count_matches(&pattern),
                exact: true,
            })
            .await?;

        let mut skip = query.effective_offset();
        let mut remaining = query.limit;
        // depth-first over sub-ranges in key order; leaves filter their own
        // quads, inner nodes aggregate recursively
        let mut stack: Vec<&IndexNode> = vec![node];
        'emit: while let Some(current) = stack.pop() {
            match current {
                IndexNode::Leaf(leaf) => {
                    for quad in leaf.quads.iter().filter(|q| pattern.matches(q)) {
                        if skip > 0 {
                            skip -= 1;
                            continue;
                        }
                        if remaining == Some(0) {
                            break 'emit;
                        }
                        destination.push(quad.clone()).await?;
                        if let Some(r) = remaining.as_mut() {
                            *r -= 1;
                        }
                    }
                }
                IndexNode::Inner(inner) => {
                    stack.extend(inner.ranges().iter().rev().map(|r| &r.child));
                }
            }
        }
        destination.close().await?;
        Ok(())
    }

    fn validate_resource_path(&self, path: &[IndexKey]) -> Result<()> {
        let node = self.root.navigate(path)?;
        if self.reduced && !node.is_leaf() {
            return Err(IndexError::usage(
                "tried to get resources from an inner node of a reduced index",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::KeyRange;
    use tpf_core::Term;

    fn quad(n: usize) -> Quad {
        Quad::triple(
            Term::iri(format!("s{n}")),
            Term::iri("p"),
            Term::literal(format!("{n}")),
        )
    }

    /// Two dimensions: decades, then years-in-decade
    fn tree() -> IndexNode {
        let decade0 = IndexNode::inner(vec![
            KeyRange::new(0, 5, IndexNode::leaf(vec![quad(0), quad(1)])).unwrap(),
            KeyRange::new(5, 10, IndexNode::leaf(vec![quad(2)])).unwrap(),
        ])
        .unwrap();
        let decade1 = IndexNode::inner(vec![
            KeyRange::new(10, 15, IndexNode::leaf(vec![quad(3)])).unwrap(),
            KeyRange::new(15, 20, IndexNode::leaf(vec![quad(4), quad(5)])).unwrap(),
        ])
        .unwrap();
        IndexNode::inner(vec![
            KeyRange::new(0, 10, decade0).unwrap(),
            KeyRange::new(10, 20, decade1).unwrap(),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn range_gates_enumerate_intersecting_sub_ranges() {
        let index = MemoryIndex::new(tree());
        let gates = index
            .query_range_gates(
                &IndexKey::from(0),
                &IndexKey::from(20),
                &[IndexKey::from(12)],
                "http://example.org/idx#",
            )
            .unwrap();
        let (gates, _) = gates.collect().await.unwrap();

        assert_eq!(
            gates,
            vec![
                RangeGate {
                    id: "http://example.org/idx#range-0".to_string(),
                    lower: IndexKey::from(10),
                    upper: IndexKey::from(15),
                },
                RangeGate {
                    id: "http://example.org/idx#range-1".to_string(),
                    lower: IndexKey::from(15),
                    upper: IndexKey::from(20),
                },
            ]
        );
    }

    #[tokio::test]
    async fn range_gates_respect_the_key_window() {
        let index = MemoryIndex::new(tree());
        let gates = index
            .query_range_gates(
                &IndexKey::from(0),
                &IndexKey::from(12),
                &[IndexKey::from(12)],
                "i#",
            )
            .unwrap();
        let (gates, _) = gates.collect().await.unwrap();
        // only [10, 15) intersects [0, 12)
        assert_eq!(gates.len(), 1);
        assert_eq!(gates[0].lower, IndexKey::from(10));
    }

    #[tokio::test]
    async fn empty_window_still_ends_cleanly() {
        let index = MemoryIndex::new(tree());
        let mut gates = index
            .query_range_gates(
                &IndexKey::from(100),
                &IndexKey::from(200),
                &[],
                "i#",
            )
            .unwrap();
        assert!(gates.next().await.is_none());
    }

    #[tokio::test]
    async fn range_gates_into_a_leaf_fail_fast() {
        let index = MemoryIndex::new(tree());
        let err = index
            .query_range_gates(
                &IndexKey::from(0),
                &IndexKey::from(20),
                &[IndexKey::from(0), IndexKey::from(0)],
                "i#",
            )
            .unwrap_err();
        assert!(matches!(err, IndexError::Usage(_)));
    }

    #[tokio::test]
    async fn leaf_resources_filter_and_paginate() {
        let index = MemoryIndex::new(tree());
        let path = [IndexKey::from(12), IndexKey::from(16)];
        let stream = index
            .query_dimensional_resources(&Query::new().with_limit(1), &path)
            .unwrap();
        let (quads, metadata) = stream.collect().await.unwrap();

        assert_eq!(quads, vec![quad(4)]);
        assert_eq!(
            metadata,
            Some(Metadata {
                total_count: 2,
                exact: true
            })
        );
    }

    #[tokio::test]
    async fn inner_resources_aggregate_children_in_key_order() {
        let index = MemoryIndex::new(tree());
        let stream = index
            .query_dimensional_resources(&Query::new(), &[])
            .unwrap();
        let (quads, metadata) = stream.collect().await.unwrap();

        assert_eq!(quads, (0..6).map(quad).collect::<Vec<_>>());
        assert_eq!(metadata.map(|m| m.total_count), Some(6));
    }

    #[tokio::test]
    async fn offset_and_limit_span_child_boundaries() {
        let index = MemoryIndex::new(tree());
        let query = Query::new().with_offset(2).with_limit(3);
        let stream = index.query_dimensional_resources(&query, &[]).unwrap();
        let (quads, metadata) = stream.collect().await.unwrap();

        assert_eq!(quads, vec![quad(2), quad(3), quad(4)]);
        // the total count ignores limit and offset
        assert_eq!(metadata.map(|m| m.total_count), Some(6));
    }

    #[tokio::test]
    async fn reduced_index_rejects_inner_node_resources() {
        let index = MemoryIndex::reduced(tree());
        let err = index
            .query_dimensional_resources(&Query::new(), &[IndexKey::from(12)])
            .unwrap_err();
        assert!(matches!(err, IndexError::Usage(_)));

        // leaf paths still work
        let path = [IndexKey::from(12), IndexKey::from(16)];
        let stream = index
            .query_dimensional_resources(&Query::new(), &path)
            .unwrap();
        let (quads, _) = stream.collect().await.unwrap();
        assert_eq!(quads.len(), 2);
    }
}

//! Index node types
//!
//! The index is a recursive tree:
//! - **Leaf nodes** hold the quads reachable via a fully specified
//!   navigation path.
//! - **Inner nodes** partition one dimension's key space into ordered,
//!   non-overlapping sub-ranges, each owning one child node.
//!
//! The tree is built once by its owning backend at load time and is
//! read-only afterwards.

use crate::error::{IndexError, Result};
use crate::key::IndexKey;
use tpf_core::{Quad, QuadPattern};

/// One sub-range of an inner node's dimension
///
/// Covers the half-open key interval `[lower, upper)`.
#[derive(Clone, Debug)]
pub struct KeyRange {
    pub lower: IndexKey,
    pub upper: IndexKey,
    pub child: IndexNode,
}

impl KeyRange {
    /// Create a sub-range; `lower` must be strictly below `upper`
    pub fn new(lower: impl Into<IndexKey>, upper: impl Into<IndexKey>, child: IndexNode) -> Result<Self> {
        let lower = lower.into();
        let upper = upper.into();
        if lower >= upper {
            return Err(IndexError::structure(format!(
                "empty key range [{lower}, {upper})"
            )));
        }
        Ok(Self { lower, upper, child })
    }

    /// Whether the range contains the given key
    pub fn contains(&self, key: &IndexKey) -> bool {
        self.lower <= *key && *key < self.upper
    }

    /// Whether the range intersects the half-open interval `[lower, upper)`
    pub fn intersects(&self, lower: &IndexKey, upper: &IndexKey) -> bool {
        self.lower < *upper && *lower < self.upper
    }
}

/// A leaf node: the quads of one fully specified navigation path
#[derive(Clone, Debug, Default)]
pub struct LeafNode {
    pub quads: Vec<Quad>,
}

/// An inner node: ordered sub-ranges of one dimension
#[derive(Clone, Debug)]
pub struct InnerNode {
    ranges: Vec<KeyRange>,
}

impl InnerNode {
    /// Create an inner node; ranges must be sorted and non-overlapping
    pub fn new(ranges: Vec<KeyRange>) -> Result<Self> {
        for pair in ranges.windows(2) {
            if pair[1].lower < pair[0].upper {
                return Err(IndexError::structure(format!(
                    "unordered or overlapping key ranges at [{}, {})",
                    pair[1].lower, pair[1].upper
                )));
            }
        }
        Ok(Self { ranges })
    }

    /// The sub-ranges, in key order
    pub fn ranges(&self) -> &[KeyRange] {
        &self.ranges
    }

    /// The child owning the sub-range containing the given key
    pub fn child_for(&self, key: &IndexKey) -> Option<&IndexNode> {
        self.ranges.iter().find(|r| r.contains(key)).map(|r| &r.child)
    }
}

/// A node of the multidimensional index tree
#[derive(Clone, Debug)]
pub enum IndexNode {
    Leaf(LeafNode),
    Inner(InnerNode),
}

impl IndexNode {
    /// Create a leaf node over the given quads
    pub fn leaf(quads: Vec<Quad>) -> Self {
        IndexNode::Leaf(LeafNode { quads })
    }

    /// Create an inner node over the given sub-ranges
    pub fn inner(ranges: Vec<KeyRange>) -> Result<Self> {
        Ok(IndexNode::Inner(InnerNode::new(ranges)?))
    }

    /// Whether this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, IndexNode::Leaf(_))
    }

    /// Resolve a navigation path, one key per dimension, from this node
    ///
    /// A path that descends past a leaf, or whose key is covered by no
    /// sub-range, is a caller defect.
    pub fn navigate(&self, path: &[IndexKey]) -> Result<&IndexNode> {
        let mut node = self;
        for key in path {
            match node {
                IndexNode::Leaf(_) => {
                    return Err(IndexError::usage(
                        "navigation path descends past a leaf node",
                    ));
                }
                IndexNode::Inner(inner) => {
                    node = inner.child_for(key).ok_or_else(|| {
                        IndexError::usage(format!("no sub-range covers key {key}"))
                    })?;
                }
            }
        }
        Ok(node)
    }

    /// Count the quads in this subtree matching the given pattern
    pub fn count_matches(&self, pattern: &QuadPattern) -> u64 {
        match self {
            IndexNode::Leaf(leaf) => {
                leaf.quads.iter().filter(|q| pattern.matches(q)).count() as u64
            }
            IndexNode::Inner(inner) => inner
                .ranges
                .iter()
                .map(|r| r.child.count_matches(pattern))
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpf_core::{Query, Term};

    fn quad(n: usize) -> Quad {
        Quad::triple(
            Term::iri(format!("s{n}")),
            Term::iri("p"),
            Term::literal(format!("{n}")),
        )
    }

    fn two_level_tree() -> IndexNode {
        IndexNode::inner(vec![
            KeyRange::new(0, 10, IndexNode::leaf(vec![quad(1), quad(2)])).unwrap(),
            KeyRange::new(10, 20, IndexNode::leaf(vec![quad(3)])).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn navigation_resolves_by_containment() {
        let tree = two_level_tree();
        let node = tree.navigate(&[IndexKey::from(12)]).unwrap();
        assert!(node.is_leaf());
        assert_eq!(node.count_matches(&QuadPattern::default()), 1);
    }

    #[test]
    fn navigation_past_a_leaf_is_a_usage_error() {
        let tree = two_level_tree();
        let err = tree
            .navigate(&[IndexKey::from(5), IndexKey::from(1)])
            .unwrap_err();
        assert!(matches!(err, IndexError::Usage(_)));
    }

    #[test]
    fn navigation_outside_all_ranges_is_a_usage_error() {
        let tree = two_level_tree();
        let err = tree.navigate(&[IndexKey::from(99)]).unwrap_err();
        assert!(matches!(err, IndexError::Usage(_)));
    }

    #[test]
    fn overlapping_ranges_are_rejected_at_build_time() {
        let result = IndexNode::inner(vec![
            KeyRange::new(0, 10, IndexNode::leaf(vec![])).unwrap(),
            KeyRange::new(5, 15, IndexNode::leaf(vec![])).unwrap(),
        ]);
        assert!(matches!(result, Err(IndexError::Structure(_))));
    }

    #[test]
    fn empty_ranges_are_rejected_at_build_time() {
        assert!(KeyRange::new(10, 10, IndexNode::leaf(vec![])).is_err());
    }

    #[test]
    fn counts_aggregate_over_the_subtree() {
        let tree = two_level_tree();
        assert_eq!(tree.count_matches(&QuadPattern::default()), 3);
        let pattern = Query::new().with_subject(Term::iri("s3")).pattern();
        assert_eq!(tree.count_matches(&pattern), 1);
    }
}

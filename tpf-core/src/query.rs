//! Query parameter types shared across datasource backends
//!
//! These types define the query interface (which quad components to match,
//! pagination, and the requested capability features) and are independent of
//! the backend that executes the query.

use crate::quad::Quad;
use crate::term::Term;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Well-known capability feature names
pub mod features {
    /// Matching triples by subject/predicate/object pattern
    pub const TRIPLE_PATTERN: &str = "triplePattern";
    /// Matching quads, including a graph component
    pub const QUAD_PATTERN: &str = "quadPattern";
    /// Limiting the number of returned quads
    pub const LIMIT: &str = "limit";
    /// Skipping a number of matching quads
    pub const OFFSET: &str = "offset";
    /// Reporting the total number of matches
    pub const TOTAL_COUNT: &str = "totalCount";
    /// Enumerating sub-range boundaries of a multidimensional index
    pub const RANGE_GATES: &str = "rangeGates";
}

/// The capability features a datasource exposes
///
/// Built once at datasource construction and frozen thereafter: there is no
/// mutating API, and datasources only hand out shared references.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet(BTreeSet<String>);

impl FeatureSet {
    /// Create a feature set from a list of enabled feature names
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self(names.iter().map(|n| n.as_ref().to_string()).collect())
    }

    /// Whether the named feature is enabled
    pub fn enabled(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Whether no feature is enabled
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The enabled feature names, in lexicographic order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// A copy of this set without the named feature
    pub fn without(&self, name: &str) -> Self {
        let mut set = self.0.clone();
        set.remove(name);
        Self(set)
    }
}

/// The quad components a query binds
///
/// Unset components are wildcards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadPattern {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
    pub graph: Option<Term>,
}

impl QuadPattern {
    /// Whether the given quad matches every bound component
    pub fn matches(&self, quad: &Quad) -> bool {
        fn component(bound: &Option<Term>, actual: &Term) -> bool {
            bound.as_ref().map_or(true, |t| t == actual)
        }
        component(&self.subject, &quad.subject)
            && component(&self.predicate, &quad.predicate)
            && component(&self.object, &quad.object)
            && component(&self.graph, &quad.graph)
    }
}

/// A quad selection query
///
/// Combines a [`QuadPattern`], pagination bounds, and the set of features the
/// caller requires from the datasource. An empty `features` map means the
/// caller requests no particular capability.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, bool>,
}

impl Query {
    /// Create an empty query (matches everything, requests no features)
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the subject
    pub fn with_subject(mut self, subject: Term) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Bind the predicate
    pub fn with_predicate(mut self, predicate: Term) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Bind the object
    pub fn with_object(mut self, object: Term) -> Self {
        self.object = Some(object);
        self
    }

    /// Bind the graph
    pub fn with_graph(mut self, graph: Term) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Set the maximum number of quads to return
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the number of matching quads to skip
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Request a feature from the datasource
    pub fn with_feature(mut self, name: &str) -> Self {
        self.features.insert(name.to_string(), true);
        self
    }

    /// The pattern components of this query
    pub fn pattern(&self) -> QuadPattern {
        QuadPattern {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            object: self.object.clone(),
            graph: self.graph.clone(),
        }
    }

    /// The effective offset (0 when unset)
    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_set_is_frozen_value() {
        let set = FeatureSet::new(&[features::TRIPLE_PATTERN, features::LIMIT]);
        assert!(set.enabled(features::TRIPLE_PATTERN));
        assert!(!set.enabled(features::OFFSET));
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["limit", "triplePattern"]);

        let without = set.without(features::LIMIT);
        assert!(!without.enabled(features::LIMIT));
        // the original is untouched
        assert!(set.enabled(features::LIMIT));
    }

    #[test]
    fn pattern_matches_bound_components() {
        let quad = Quad::triple(Term::iri("s"), Term::iri("p"), Term::literal("o"));
        let pattern = Query::new()
            .with_subject(Term::iri("s"))
            .with_object(Term::literal("o"))
            .pattern();
        assert!(pattern.matches(&quad));

        let miss = Query::new().with_subject(Term::iri("other")).pattern();
        assert!(!miss.matches(&quad));
    }

    #[test]
    fn pattern_graph_component_distinguishes_default_graph() {
        let triple = Quad::triple(Term::iri("s"), Term::iri("p"), Term::iri("o"));
        let named = Quad::new(Term::iri("s"), Term::iri("p"), Term::iri("o"), Term::iri("g"));

        let default_only = Query::new().with_graph(Term::DefaultGraph).pattern();
        assert!(default_only.matches(&triple));
        assert!(!default_only.matches(&named));

        let named_only = Query::new().with_graph(Term::iri("g")).pattern();
        assert!(!named_only.matches(&triple));
        assert!(named_only.matches(&named));
    }
}

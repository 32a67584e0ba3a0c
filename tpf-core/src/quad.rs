//! Quads - the fundamental data unit served by a datasource
//!
//! A [`Quad`] is a subject-predicate-object-graph statement. A triple is a
//! quad whose graph is the default-graph marker.

use crate::term::Term;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subject-predicate-object-graph statement
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Term,
}

impl Quad {
    /// Create a quad with an explicit graph
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }

    /// Create a triple (a quad in the default graph)
    pub fn triple(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: Term::DefaultGraph,
        }
    }

    /// Whether this quad lives in the default graph
    pub fn is_triple(&self) -> bool {
        self.graph.is_default_graph()
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if !self.is_triple() {
            write!(f, " {}", self.graph)?;
        }
        write!(f, " .")
    }
}

//! RDF terms
//!
//! A [`Term`] is an immutable value occupying one position of a quad:
//! an IRI, a blank node, a literal, or the default-graph marker.
//!
//! Blank node identifiers are stored without the `_:` convention prefix;
//! the datasource layer is responsible for translating between local
//! blank node identifiers and their skolem IRIs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One position of a quad.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A named node, identified by IRI
    Iri(String),
    /// A blank node, identified by a document-local identifier
    BlankNode(String),
    /// A literal value with optional datatype IRI and language tag
    Literal {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// The default graph of a dataset
    DefaultGraph,
}

impl Term {
    /// Create an IRI term
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    /// Create a blank node term from a local identifier
    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode(id.into())
    }

    /// Create a plain literal term
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Create a literal term with an explicit datatype IRI
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// Whether this term is a blank node
    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// Whether this term is the default-graph marker
    pub fn is_default_graph(&self) -> bool {
        matches!(self, Term::DefaultGraph)
    }

    /// The lexical value of the term
    ///
    /// IRIs and blank nodes yield their identifier, literals their lexical
    /// form, and the default graph the empty string.
    pub fn value(&self) -> &str {
        match self {
            Term::Iri(v) => v,
            Term::BlankNode(v) => v,
            Term::Literal { value, .. } => value,
            Term::DefaultGraph => "",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(v) => write!(f, "<{v}>"),
            Term::BlankNode(v) => write!(f, "_:{v}"),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "\"{value}\"")?;
                if let Some(lang) = language {
                    write!(f, "@{lang}")?;
                } else if let Some(dt) = datatype {
                    write!(f, "^^<{dt}>")?;
                }
                Ok(())
            }
            Term::DefaultGraph => Ok(()),
        }
    }
}

//! The datasource contract
//!
//! A [`Datasource`] gates, translates, and streams quad queries uniformly
//! across backends. It owns no storage itself: the backend-specific
//! execution step lives behind the [`Backend`] capability trait, selected at
//! construction.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──initialize()──▶ Initializing ──▶ Ready
//!                                       │
//!                                       └─────────▶ Failed  (permanent)
//! ```
//!
//! `initialize` is idempotent and fires exactly one terminal transition,
//! whether the backend setup step fails by returning an error or by never
//! having been valid in the first place. `close` may be called at any time,
//! including while initialization is still pending; the actual resource
//! release is deferred until the lifecycle has settled and happens once.
//!
//! # Term translation
//!
//! Inbound queries and outbound quads pass through a translation layer:
//! bound IRIs carrying the configured blank-node prefix become blank nodes
//! on the way in, and blank nodes are skolemized (prefix-concatenated) on
//! the way out unless blacklisted. When a custom default graph is
//! configured, querying the true default graph is rewritten to an internal
//! sentinel graph, and backend output is mapped back accordingly.

pub mod memory;

use crate::error::{Error, Result};
use crate::fetch::{self, ByteStream};
use crate::query::{features, FeatureSet, Query};
use crate::quad::Quad;
use crate::stream::{self, EventStream, Sink};
use crate::term::Term;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// A stream of translated result quads
pub type QuadStream = EventStream<Quad>;

/// Callback receiving admission and stream errors
pub type ErrorCallback = Box<dyn FnMut(Error) + Send + 'static>;

/// Default blank-node skolem prefix
pub const DEFAULT_BLANK_NODE_PREFIX: &str = "genid:";

/// Internal graph identifier standing in for the true default graph when a
/// custom default graph is configured and both must stay distinguishable
pub const EMPTY_GRAPH_SENTINEL: &str = "urn:tpf:emptyGraph";

/// Backend-specific execution capability
///
/// One backend resource may be targeted by multiple concurrent queries; the
/// contract imposes no locking, so an implementation whose resource does not
/// tolerate concurrent reads must serialize internally.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The capability features this backend supports
    fn features(&self) -> &[&str];

    /// Prepare the backend for querying; called at most once
    async fn initialize(&self) -> Result<()>;

    /// Execute a translated query against the given destination
    ///
    /// Must push zero or more quads, set the metadata property at least once
    /// before finishing, and signal completion or failure exactly once on
    /// the destination. A returned `Err` is redirected by the contract onto
    /// the destination's error channel; it is never propagated to the
    /// `select` caller.
    async fn execute(&self, query: Query, destination: Sink<Quad>) -> Result<()>;

    /// Release backend resources; called at most once, after the lifecycle
    /// has settled
    async fn close(&self) -> Result<()>;
}

/// Datasource lifecycle states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl LifecycleState {
    /// Whether the lifecycle can no longer change
    pub fn is_settled(self) -> bool {
        matches!(self, LifecycleState::Ready | LifecycleState::Failed)
    }
}

/// Construction options for a datasource
///
/// Produced by configuration collaborators; everything besides `path` is
/// optional. `quads: Some(false)` marks a datasource that serves triples
/// only, removing the quad-pattern feature regardless of the backend.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasourceOptions {
    pub path: String,
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub homepage: Option<String>,
    /// Custom default graph: triples are published in this graph
    pub graph: Option<String>,
    pub blank_node_prefix: Option<String>,
    pub skolemize_blacklist: Vec<String>,
    pub quads: Option<bool>,
}

impl DatasourceOptions {
    /// Options holding only a path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Identity of a datasource, as shown to view collaborators
#[derive(Clone, Debug, Default)]
pub struct DatasourceInfo {
    pub path: String,
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub homepage: Option<String>,
}

/// Uniform queryable access to a source of quads
pub struct Datasource {
    info: DatasourceInfo,
    features: FeatureSet,
    translator: Translator,
    backend: Arc<dyn Backend>,
    state: Arc<watch::Sender<LifecycleState>>,
    init_started: AtomicBool,
    closed: AtomicBool,
    error_tx: mpsc::UnboundedSender<Error>,
    error_rx: Mutex<Option<mpsc::UnboundedReceiver<Error>>>,
}

impl Datasource {
    /// Create a datasource over the given backend
    ///
    /// The feature set is computed here and frozen for the lifetime of the
    /// instance.
    pub fn new(options: DatasourceOptions, backend: Arc<dyn Backend>) -> Self {
        let mut feature_set = FeatureSet::new(backend.features());
        if options.quads == Some(false) {
            feature_set = feature_set.without(features::QUAD_PATTERN);
        }
        let blank_node_prefix = options
            .blank_node_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_BLANK_NODE_PREFIX.to_string());
        let translator = Translator {
            blank_node_prefix,
            skolemize_blacklist: options.skolemize_blacklist.iter().cloned().collect(),
            graph: options.graph.clone().map(Term::Iri),
        };
        let info = DatasourceInfo {
            path: options.path,
            id: options.id,
            title: options.title,
            description: options.description,
            license: options.license,
            license_url: options.license_url,
            homepage: options.homepage,
        };
        let (state, _) = watch::channel(LifecycleState::Uninitialized);
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        Self {
            info,
            features: feature_set,
            translator,
            backend,
            state: Arc::new(state),
            init_started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            error_tx,
            error_rx: Mutex::new(Some(error_rx)),
        }
    }

    /// The identity of this datasource
    pub fn info(&self) -> &DatasourceInfo {
        &self.info
    }

    /// The frozen feature set of this datasource
    pub fn supported_features(&self) -> &FeatureSet {
        &self.features
    }

    /// Whether initialization has completed successfully
    pub fn initialized(&self) -> bool {
        *self.state.borrow() == LifecycleState::Ready
    }

    /// The current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Receiver for datasource-level errors nobody else observed
    ///
    /// Returns `None` after the first call; there is one owning observer.
    pub fn errors(&self) -> Option<mpsc::UnboundedReceiver<Error>> {
        self.error_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    /// Trigger the backend-specific setup step
    ///
    /// Idempotent: only the first call starts initialization, and exactly
    /// one terminal lifecycle transition fires, to `Ready` or to `Failed`.
    /// After `Failed`, the datasource permanently rejects all queries. A
    /// datasource that was closed before its first `initialize` stays
    /// uninitialized; the backend resource is never opened past its release.
    pub fn initialize(&self) {
        if self.closed.load(Ordering::SeqCst) {
            debug!(datasource = %self.info.path, "ignoring initialize: already closed");
            return;
        }
        if self.init_started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.state.send_replace(LifecycleState::Initializing);
        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        let errors = self.error_tx.clone();
        let path = self.info.path.clone();
        tokio::spawn(async move {
            match backend.initialize().await {
                Ok(()) => {
                    debug!(datasource = %path, "datasource initialized");
                    state.send_replace(LifecycleState::Ready);
                }
                Err(error) => {
                    warn!(datasource = %path, %error, "datasource initialization failed");
                    let _ = errors.send(Error::initialization(error.to_string()));
                    state.send_replace(LifecycleState::Failed);
                }
            }
        });
    }

    /// Wait until the lifecycle has settled and return the terminal state
    ///
    /// Resolves immediately when initialization has not been triggered yet
    /// (the state can then only be `Uninitialized`).
    pub async fn settled(&self) -> LifecycleState {
        let mut rx = self.state.subscribe();
        loop {
            let state = *rx.borrow();
            if state.is_settled() || state == LifecycleState::Uninitialized {
                return state;
            }
            if rx.changed().await.is_err() {
                return *self.state.borrow();
            }
        }
    }

    /// Whether this datasource can evaluate the given query
    ///
    /// A datasource that is not ready supports nothing. A query requesting
    /// features is supported iff every feature requested as `true` is
    /// enabled here (features requested as `false` are ignored). A query
    /// requesting no features is supported iff at least one feature is
    /// enabled.
    pub fn supports_query(&self, query: &Query) -> bool {
        if !self.initialized() {
            return false;
        }
        if query.features.is_empty() {
            return !self.features.is_empty();
        }
        query
            .features
            .iter()
            .filter(|(_, requested)| **requested)
            .all(|(name, _)| self.features.enabled(name))
    }

    /// Select the quads matching the given query
    ///
    /// Admission failures (`NotInitialized`, `UnsupportedQuery`) are
    /// reported through `on_error` and yield no stream. Otherwise the query
    /// is executed against a private translated copy and the returned
    /// stream carries skolemized, graph-mapped quads plus the forwarded
    /// metadata property. If `on_error` is supplied it also observes stream
    /// errors; either way an error terminates the stream in-band, so it can
    /// never go unnoticed.
    pub fn select(&self, query: &Query, mut on_error: Option<ErrorCallback>) -> Option<QuadStream> {
        if !self.initialized() {
            debug!(datasource = %self.info.path, "rejecting select: not initialized");
            if let Some(cb) = on_error.as_mut() {
                cb(Error::NotInitialized);
            }
            return None;
        }
        if !self.supports_query(query) {
            debug!(datasource = %self.info.path, "rejecting select: unsupported query");
            if let Some(cb) = on_error.as_mut() {
                cb(Error::UnsupportedQuery);
            }
            return None;
        }

        // the caller's query is never touched: all rewriting happens on a copy
        let translated = self.translator.translate_query(query.clone());

        let (destination, mut raw) = stream::channel(stream::DEFAULT_CAPACITY);
        let backend = Arc::clone(&self.backend);
        let exec_sink = destination.clone();
        tokio::spawn(async move {
            // a failing execution step surfaces on the stream, never here
            if let Err(error) = backend.execute(translated, destination).await {
                let _ = exec_sink.fail(error).await;
            }
        });

        let (out_sink, out) = stream::channel(stream::DEFAULT_CAPACITY);
        let translator = self.translator.clone();
        tokio::spawn(async move {
            let mut metadata_forwarded = false;
            loop {
                let next = raw.next().await;
                if !metadata_forwarded {
                    if let Some(metadata) = raw.metadata() {
                        metadata_forwarded = true;
                        if out_sink.set_metadata(metadata).await.is_err() {
                            return;
                        }
                    }
                }
                match next {
                    Some(Ok(quad)) => {
                        let quad = translator.translate_quad(quad);
                        if out_sink.push(quad).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(error)) => {
                        if let Some(cb) = on_error.as_mut() {
                            cb(error.clone());
                        }
                        let _ = out_sink.fail(error).await;
                        return;
                    }
                    None => {
                        let _ = out_sink.close().await;
                        return;
                    }
                }
            }
        });
        Some(out)
    }

    /// Retrieve a byte stream through the local filesystem or HTTP(S)
    ///
    /// Errors travel on the returned stream; if its consumer is gone by the
    /// time an error surfaces, the error is promoted to this datasource's
    /// [`errors`](Self::errors) channel.
    pub fn fetch(&self, url: &str) -> ByteStream {
        fetch::fetch(url, self.error_tx.clone())
    }

    /// Release backend resources
    ///
    /// Waits for a pending initialization to settle first, then releases
    /// exactly once; later calls are no-ops. Closing before `initialize`
    /// was ever triggered also prevents any later initialization.
    pub async fn close(&self) -> Result<()> {
        let mut rx = self.state.subscribe();
        while *rx.borrow() == LifecycleState::Initializing {
            if rx.changed().await.is_err() {
                break;
            }
        }
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!(datasource = %self.info.path, "closing datasource");
        self.backend.close().await
    }
}

/// Blank-node and default-graph translation, applied inside the contract
#[derive(Clone, Debug)]
struct Translator {
    blank_node_prefix: String,
    skolemize_blacklist: HashSet<String>,
    /// Custom default graph, when configured
    graph: Option<Term>,
}

impl Translator {
    /// Rewrite inbound bound terms on a private copy of the query
    fn translate_query(&self, mut query: Query) -> Query {
        query.subject = query.subject.take().map(|t| self.deskolemize(t));
        query.object = query.object.take().map(|t| self.deskolemize(t));
        query.graph = query.graph.take().map(|t| self.deskolemize(t));

        // with a custom default graph, the true default graph is queried
        // through the sentinel, and the custom graph as the default graph
        if let Some(custom) = &self.graph {
            match &query.graph {
                Some(Term::DefaultGraph) => {
                    query.graph = Some(Term::iri(EMPTY_GRAPH_SENTINEL));
                }
                Some(g) if g == custom => {
                    query.graph = Some(Term::DefaultGraph);
                }
                _ => {}
            }
        }
        query
    }

    /// Rewrite one outbound quad
    fn translate_quad(&self, mut quad: Quad) -> Quad {
        quad.subject = self.skolemize(quad.subject);
        quad.object = self.skolemize(quad.object);
        if !quad.graph.is_default_graph() {
            quad.graph = self.skolemize(quad.graph);
        }
        if let Some(custom) = &self.graph {
            if quad.graph.is_default_graph() {
                quad.graph = custom.clone();
            } else if matches!(&quad.graph, Term::Iri(v) if v == EMPTY_GRAPH_SENTINEL) {
                quad.graph = Term::DefaultGraph;
            }
        }
        quad
    }

    /// Prefix-bearing IRI to blank node
    fn deskolemize(&self, term: Term) -> Term {
        match term {
            Term::Iri(v) if v.starts_with(&self.blank_node_prefix) => {
                Term::BlankNode(v[self.blank_node_prefix.len()..].to_string())
            }
            other => other,
        }
    }

    /// Blank node to prefix-concatenated IRI, unless blacklisted
    fn skolemize(&self, term: Term) -> Term {
        match term {
            Term::BlankNode(id) if !self.skolemize_blacklist.contains(&id) => {
                Term::Iri(format!("{}{}", self.blank_node_prefix, id))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator(graph: Option<&str>) -> Translator {
        Translator {
            blank_node_prefix: "genid:".to_string(),
            skolemize_blacklist: ["hidden".to_string()].into_iter().collect(),
            graph: graph.map(Term::iri),
        }
    }

    #[test]
    fn skolemization_round_trip() {
        let t = translator(None);
        let out = t.skolemize(Term::blank("b12"));
        assert_eq!(out, Term::iri("genid:b12"));
        assert_eq!(t.deskolemize(out), Term::blank("b12"));
    }

    #[test]
    fn blacklisted_blank_nodes_stay_local() {
        let t = translator(None);
        assert_eq!(t.skolemize(Term::blank("hidden")), Term::blank("hidden"));
    }

    #[test]
    fn query_graph_replacements() {
        let t = translator(Some("http://example.org/custom"));

        let q = t.translate_query(Query::new().with_graph(Term::DefaultGraph));
        assert_eq!(q.graph, Some(Term::iri(EMPTY_GRAPH_SENTINEL)));

        let q = t.translate_query(Query::new().with_graph(Term::iri("http://example.org/custom")));
        assert_eq!(q.graph, Some(Term::DefaultGraph));

        // any other graph passes through unchanged
        let q = t.translate_query(Query::new().with_graph(Term::iri("http://example.org/other")));
        assert_eq!(q.graph, Some(Term::iri("http://example.org/other")));
    }

    #[test]
    fn output_graph_replacements() {
        let t = translator(Some("http://example.org/custom"));
        let s = || Term::iri("s");
        let p = || Term::iri("p");
        let o = || Term::iri("o");

        let q = t.translate_quad(Quad::triple(s(), p(), o()));
        assert_eq!(q.graph, Term::iri("http://example.org/custom"));

        let q = t.translate_quad(Quad::new(s(), p(), o(), Term::iri(EMPTY_GRAPH_SENTINEL)));
        assert_eq!(q.graph, Term::DefaultGraph);

        let q = t.translate_quad(Quad::new(s(), p(), o(), Term::iri("g")));
        assert_eq!(q.graph, Term::iri("g"));
    }

    #[test]
    fn no_custom_graph_passes_through() {
        let t = translator(None);
        let q = t.translate_quad(Quad::triple(Term::iri("s"), Term::iri("p"), Term::iri("o")));
        assert_eq!(q.graph, Term::DefaultGraph);
    }
}

//! HDT-backed datasource backend
//!
//! Loads one compressed binary document at initialization time and serves
//! pattern pages from it. The format stores triples only: a query binding
//! a non-default graph short-circuits to an empty, exactly-counted result.

use crate::document::{HdtDocument, HdtLoader};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tpf_core::{features, Backend, Error, Metadata, Quad, Query, Result, Sink};
use tracing::debug;

const HDT_FEATURES: &[&str] = &[
    features::TRIPLE_PATTERN,
    features::QUAD_PATTERN,
    features::LIMIT,
    features::OFFSET,
    features::TOTAL_COUNT,
];

/// Backend over one HDT document
pub struct HdtBackend {
    file: PathBuf,
    loader: Arc<dyn HdtLoader>,
    document: RwLock<Option<Arc<dyn HdtDocument>>>,
}

impl HdtBackend {
    /// Create a backend that will load the given file
    ///
    /// A `file://` prefix on the path is accepted and stripped.
    pub fn new(file: impl Into<String>, loader: Arc<dyn HdtLoader>) -> Self {
        let file = file.into();
        let path = file.strip_prefix("file://").unwrap_or(&file);
        Self {
            file: PathBuf::from(path),
            loader,
            document: RwLock::new(None),
        }
    }
}

#[async_trait]
impl Backend for HdtBackend {
    fn features(&self) -> &[&str] {
        HDT_FEATURES
    }

    async fn initialize(&self) -> Result<()> {
        let document = self.loader.open(&self.file).await?;
        debug!(file = %self.file.display(), "opened HDT document");
        *self.document.write().await = Some(document);
        Ok(())
    }

    async fn execute(&self, query: Query, destination: Sink<Quad>) -> Result<()> {
        // triples only: any bound named graph has no results
        if matches!(&query.graph, Some(g) if !g.is_default_graph()) {
            destination
                .set_metadata(Metadata {
                    total_count: 0,
                    exact: true,
                })
                .await?;
            destination.close().await?;
            return Ok(());
        }

        let document = self
            .document
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::backend("the HDT document is closed"))?;

        let offset = query.effective_offset();
        let result = document
            .search(&query.pattern(), query.limit, offset)
            .await?;

        // the document's estimate must never under-report what this page
        // already proves: offset plus the returned quads
        let returned = result.quads.len() as u64;
        let floor = offset as u64 + returned;
        let total_count = if returned > 0 && result.total_count < floor {
            floor
        } else {
            result.total_count
        };

        destination
            .set_metadata(Metadata {
                total_count,
                exact: result.exact,
            })
            .await?;
        for quad in result.quads {
            destination.push(quad).await?;
        }
        destination.close().await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // release the document once; later closes find nothing to do
        let document = self.document.write().await.take();
        if let Some(document) = document {
            debug!(file = %self.file.display(), "closing HDT document");
            document.close().await?;
        }
        Ok(())
    }
}

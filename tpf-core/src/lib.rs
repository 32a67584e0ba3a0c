//! # TPF Core
//!
//! Core library for serving fragments of large quad datasets: the data
//! model, the query interface, the bounded result-stream primitive, and the
//! datasource contract that concrete backends plug into.
//!
//! This crate provides:
//! - Core types: [`Term`], [`Quad`], [`Query`], [`FeatureSet`]
//! - The bounded push-stream with out-of-band [`Metadata`]
//! - The [`Datasource`] contract: lifecycle, capability negotiation,
//!   blank-node/default-graph translation, and backpressured streaming
//! - A plain in-memory backend, [`MemoryBackend`]
//!
//! ## Design principles
//!
//! 1. **Composition over inheritance**: backends implement the [`Backend`]
//!    capability trait; there is exactly one `Datasource` type.
//! 2. **Errors never cross the `select` boundary**: admission failures go to
//!    the error callback, execution failures terminate the result stream.
//! 3. **Structural backpressure**: every result stream is a bounded channel;
//!    producers suspend when the consumer lags and stop when it goes away.

pub mod datasource;
pub mod error;
pub mod fetch;
pub mod quad;
pub mod query;
pub mod stream;
pub mod term;

// Re-export main types
pub use datasource::memory::MemoryBackend;
pub use datasource::{
    Backend, Datasource, DatasourceInfo, DatasourceOptions, ErrorCallback, LifecycleState,
    QuadStream, DEFAULT_BLANK_NODE_PREFIX, EMPTY_GRAPH_SENTINEL,
};
pub use error::{Error, Result};
pub use fetch::ByteStream;
pub use quad::Quad;
pub use query::{features, FeatureSet, QuadPattern, Query};
pub use stream::{channel, EventStream, Metadata, Sink, StreamEvent};
pub use term::Term;

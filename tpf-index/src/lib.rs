//! # TPF Index
//!
//! In-memory multidimensional range index for paging through large quad
//! datasets, plus the datasource backend that serves it.
//!
//! The index is a recursive tree ([`IndexNode`]): inner nodes partition one
//! ordered dimension into sub-ranges, leaves hold the quads of a fully
//! specified navigation path. Two query shapes are supported: cheap
//! range-gate discovery ([`MemoryIndex::query_range_gates`]) and
//! backpressured resource retrieval
//! ([`MemoryIndex::query_dimensional_resources`]). Separating the two lets
//! a client page through an arbitrarily large dataset without the server
//! ever materializing it for a single request.

pub mod datasource;
pub mod error;
pub mod key;
pub mod memory;
pub mod node;

// Re-export main types
pub use datasource::IndexBackend;
pub use error::{IndexError, Result};
pub use key::IndexKey;
pub use memory::{MemoryIndex, RangeGate, RangeGateStream};
pub use node::{IndexNode, InnerNode, KeyRange, LeafNode};

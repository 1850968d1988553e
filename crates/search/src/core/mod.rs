//! Core traits and wire types.
//!
//! - [`SearchBackend`] - The façade contract callers program against
//! - [`SolrTransport`] - The client abstraction backends talk through
//!
//! ```text
//! caller ── SearchBackend ── SolrBackend ── SolrTransport ── engine
//! ```

pub mod backend;
pub mod transport;

pub use backend::{IndexBatch, SchemaField, SearchBackend};
pub use transport::{
    DeleteTarget, RawDocList, RawFacetCounts, RawPivot, RawResponse, RawSpellcheck, SolrParams,
    SolrTransport,
};

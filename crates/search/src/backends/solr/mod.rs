//! Apache Solr backend implementation.
//!
//! Translates [`QueryState`](crate::types::QueryState) into Solr request
//! parameters and normalizes Solr's JSON responses into
//! [`SearchResults`](crate::types::SearchResults).
//!
//! Writes go to the primary core; searches and more-like-this go to the
//! replica, which defaults to the primary.
//!
//! # Example
//!
//! ```ignore
//! use quarry_search::backends::solr::{SolrBackend, SolrConfig};
//! use quarry_search::types::QueryState;
//!
//! let config = SolrConfig {
//!     primary_url: "http://localhost:8983/solr/blog".to_string(),
//!     ..Default::default()
//! };
//! let backend = SolrBackend::new(config)?;
//! let results = backend.search(&QueryState::new("hello")).await?;
//! ```

mod backend;
#[cfg(feature = "http")]
mod client;
mod schema;
pub mod search;

pub use backend::{DEFAULT_CONTENT_FIELD, MLT_FIELD_LIST, SolrBackend, SolrConfig};
#[cfg(feature = "http")]
pub use client::{HttpSolrClient, update_body};
pub use schema::build_schema;

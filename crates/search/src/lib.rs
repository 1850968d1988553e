//! Quarry Search
//!
//! A backend-agnostic search layer. Callers describe searches as a
//! [`QueryState`](types::QueryState); the Solr backend compiles it into Solr
//! request parameters, runs it through a [`SolrTransport`](core::SolrTransport)
//! and normalizes the JSON response into typed
//! [`SearchResults`](types::SearchResults).
//!
//! # Features
//!
//! - **Query compilation**: filter operators, `AND`/`OR` connectors,
//!   negation, reserved-syntax escaping for user input
//! - **Faceting**: field, date-range, query and pivot facets, with
//!   exclusion tags and facet labels mapped back to logical field names
//! - **Highlighting, spelling suggestions, more-like-this and dismax tuning**
//! - **Routing**: several backends under connection aliases
//!
//! The reqwest-based HTTP transport sits behind the `http` feature, which is
//! on by default. Turn it off to plug in your own transport:
//!
//! ```toml
//! [dependencies]
//! quarry-search = { version = "0.1", default-features = false }
//! ```
//!
//! # Architecture
//!
//! - [`types`] - Field values, entity references, query state and results
//! - [`schema`] - Field schemas and the entity schema registry
//! - [`error`] - Error types for all operations
//! - [`core`] - The backend façade and transport traits
//! - [`backends`] - Backend implementations (Solr)
//! - [`routing`] - Connection aliases and read/write routers
//!
//! # Compiling a search
//!
//! ```
//! use quarry_search::backends::solr::search::{RequestAssembler, SearchSettings};
//! use quarry_search::schema::{EntitySchema, FieldSchema, FieldType, SchemaRegistry};
//! use quarry_search::types::{EntityType, Filter, QueryState};
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register(
//!     EntitySchema::new(EntityType::new("shop", "product"))
//!         .with_field(FieldSchema::new("text", FieldType::Text).document())
//!         .with_field(FieldSchema::new("price", FieldType::Float).with_index_name("price_f")),
//! );
//!
//! let state = QueryState::new("lamp").with_filter(Filter::lookup("price__gte", 10)?);
//! let request = RequestAssembler::new(&registry, SearchSettings::default())
//!     .assemble(&state)?
//!     .ok_or("nothing to search")?;
//!
//! assert_eq!(request.query, "lamp AND price_f:[10 TO *]");
//! assert_eq!(request.params.get("fq"), Some("entity_type:(shop.product)"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod routing;
pub mod schema;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{SearchError, SearchResult};
pub use types::{EntityRef, EntityType, FieldValue, QueryState, SearchHit, SearchResults};

// Re-export core traits
pub use core::{SearchBackend, SolrTransport};

pub use backends::solr::{SolrBackend, SolrConfig};
pub use routing::{ConnectionHandler, ConnectionRouter, DefaultRouter, Router};
pub use schema::{EntityIndex, SchemaRegistry};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

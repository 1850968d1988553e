//! Core types for queries and results.
//!
//! - [`value`] - Typed field values
//! - [`entity`] - Entity types, references and reserved field names
//! - [`query`] - Query state, filters and facet requests
//! - [`results`] - Normalized hits and facet counts

pub mod entity;
pub mod query;
pub mod results;
pub mod value;

pub use entity::{CONTENT_FIELD, EntityRef, EntityType, ID_FIELD, PK_FIELD, SCORE_FIELD, TYPE_FIELD};
pub use query::{
    Connector, DateFacetRequest, FacetOptions, FacetRequest, Filter, FilterOperator, GapUnit,
    NarrowQuery, PivotFacetRequest, QueryFacet, QueryState, SortDirection, SortDirective,
};
pub use results::{
    FacetCount, FacetCounts, FieldMap, Highlights, PivotFacet, ResultRecord, SearchHit,
    SearchResults,
};
pub use value::FieldValue;

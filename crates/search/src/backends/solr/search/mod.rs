//! Solr query translation and response handling.
//!
//! Request side: [`encoder`] → [`query_builder`] → [`facets`] → [`params`].
//! Response side: [`normalizer`] → [`facet_labels`].

pub mod encoder;
pub mod facet_labels;
pub mod facets;
pub mod normalizer;
pub mod params;
pub mod query_builder;

pub use normalizer::ResultNormalizer;
pub use params::{DISMAX_PARAMETERS, RequestAssembler, SearchSettings, SolrRequest};

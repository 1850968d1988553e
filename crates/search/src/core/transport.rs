//! Transport boundary to the search engine.
//!
//! [`SolrTransport`] is the client abstraction the backend talks to. The
//! wire types in this module mirror the parts of Solr's JSON response that
//! the result normalizer reads; everything else is ignored.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::TransportError;
use crate::types::{FieldMap, Highlights};

/// Request parameters sent to the engine.
///
/// An ordered multimap: Solr accepts repeated keys (`fq`, `facet.field`, ...)
/// and their order is kept on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolrParams {
    pairs: Vec<(String, String)>,
}

impl SolrParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every value of `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.pairs.retain(|(k, _)| *k != key);
        self.pairs.push((key, value.into()));
    }

    /// Appends a value for `key`, keeping existing ones.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Returns the first value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value of `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if `key` has at least one value.
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Iterates over all key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of key/value pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// What a delete removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// One document by unique identifier.
    Id(String),
    /// Every document matching a query.
    Query(String),
}

/// Client abstraction over a Solr core.
///
/// Failures are reported as [`TransportError`]; the backend decides whether
/// to propagate or absorb them.
#[async_trait]
pub trait SolrTransport: Send + Sync {
    /// Adds (or replaces) documents, keyed by physical field name.
    async fn add(
        &self,
        documents: Vec<FieldMap>,
        commit: bool,
        boosts: &BTreeMap<String, f32>,
    ) -> Result<(), TransportError>;

    /// Deletes documents.
    async fn delete(&self, target: DeleteTarget, commit: bool) -> Result<(), TransportError>;

    /// Optimizes the index.
    async fn optimize(&self) -> Result<(), TransportError>;

    /// Runs a query through the standard request handler.
    async fn search(&self, query: &str, params: &SolrParams)
    -> Result<RawResponse, TransportError>;

    /// Runs a query through the more-like-this handler.
    async fn more_like_this(
        &self,
        query: &str,
        similarity_field: &str,
        params: &SolrParams,
    ) -> Result<RawResponse, TransportError>;
}

/// Raw search response as returned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawResponse {
    /// Matching documents.
    #[serde(default)]
    pub response: RawDocList,
    /// Facet block, present when faceting was requested.
    #[serde(default)]
    pub facet_counts: Option<RawFacetCounts>,
    /// Highlighting fragments keyed by document identifier.
    #[serde(default)]
    pub highlighting: Option<HashMap<String, Highlights>>,
    /// Spellcheck block.
    #[serde(default)]
    pub spellcheck: Option<RawSpellcheck>,
}

impl RawResponse {
    /// A response with no hits.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The `response` block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDocList {
    /// Engine-reported total hit count.
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
    /// Documents keyed by physical field name.
    #[serde(default)]
    pub docs: Vec<Map<String, Value>>,
}

/// The `facet_counts` block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFacetCounts {
    /// Field facets as alternating label/count arrays.
    #[serde(default)]
    pub facet_fields: BTreeMap<String, Vec<Value>>,
    /// Date facets: bucket label to count, mixed with `gap`/`start`/`end` entries.
    #[serde(default)]
    pub facet_dates: BTreeMap<String, Map<String, Value>>,
    /// Query facets.
    #[serde(default)]
    pub facet_queries: BTreeMap<String, u64>,
    /// Pivot facets keyed by comma-joined field path.
    #[serde(default)]
    pub facet_pivot: BTreeMap<String, Vec<RawPivot>>,
}

/// One node of a pivot facet tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPivot {
    /// Field this node buckets on.
    pub field: String,
    /// Bucket value, of whatever JSON type the field has.
    pub value: Value,
    /// Matching documents.
    pub count: u64,
    /// Nested buckets of the next field.
    #[serde(default)]
    pub pivot: Option<Vec<RawPivot>>,
}

/// The `spellcheck` block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSpellcheck {
    /// Flattened suggestion list; the collation is the last entry.
    #[serde(default)]
    pub suggestions: Vec<Value>,
}

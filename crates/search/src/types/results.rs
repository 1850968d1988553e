//! Normalized search results.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::entity::{EntityRef, EntityType};
use super::value::FieldValue;

/// Additional fields reconstructed from a raw document, keyed by field name.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Highlighted fragments for one document, keyed by field name.
pub type Highlights = HashMap<String, Vec<String>>;

/// One normalized search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Entity type of the matched document.
    pub entity_type: EntityType,
    /// Primary key of the matched entity.
    pub primary_key: String,
    /// Relevance score, when the engine returned one.
    pub score: Option<f64>,
    /// Highlighted fragments, when highlighting was requested and returned.
    pub highlighted: Option<Highlights>,
    /// Every other stored field, converted to typed values.
    pub fields: FieldMap,
}

impl SearchHit {
    /// Returns a reference to the matched entity.
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type.clone(), self.primary_key.clone())
    }

    /// Returns a stored field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Builds caller-facing result records from normalized hits.
pub trait ResultRecord: Sized + Send {
    /// Creates the record for one hit.
    fn from_hit(hit: SearchHit) -> Self;
}

impl ResultRecord for SearchHit {
    fn from_hit(hit: SearchHit) -> Self {
        hit
    }
}

/// A facet bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    /// Bucket label.
    pub label: String,
    /// Number of matching documents.
    pub count: u64,
}

impl FacetCount {
    /// Creates a bucket.
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// A pivot facet bucket with its nested buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotFacet {
    /// Bucket label.
    pub label: String,
    /// Number of matching documents.
    pub count: u64,
    /// Buckets of the next pivot field, empty at the innermost level.
    pub children: Vec<PivotFacet>,
}

/// Facet counts grouped by facet type, keyed by field (or comma-joined field path).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCounts {
    /// Field facets.
    pub fields: BTreeMap<String, Vec<FacetCount>>,
    /// Date facets.
    pub dates: BTreeMap<String, Vec<FacetCount>>,
    /// Query facets, keyed by the facet query.
    pub queries: BTreeMap<String, u64>,
    /// Pivot facets.
    pub pivots: BTreeMap<String, Vec<PivotFacet>>,
}

impl FacetCounts {
    /// Returns true if no facet of any type is present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self.dates.is_empty()
            && self.queries.is_empty()
            && self.pivots.is_empty()
    }
}

/// The caller-facing outcome of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults<R = SearchHit> {
    /// Result records, in engine order.
    pub results: Vec<R>,
    /// Hit count. Documents of unregistered entity types are subtracted from
    /// the engine's count, so this is approximate when any were skipped.
    pub hits: u64,
    /// Facet counts.
    pub facets: FacetCounts,
    /// Collated spelling suggestion.
    pub spelling_suggestion: Option<String>,
}

impl<R> SearchResults<R> {
    /// A result with no hits.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            hits: 0,
            facets: FacetCounts::default(),
            spelling_suggestion: None,
        }
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<R> Default for SearchResults<R> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_results() {
        let results: SearchResults = SearchResults::empty();
        assert!(results.is_empty());
        assert_eq!(results.hits, 0);
        assert!(results.facets.is_empty());
        assert!(results.spelling_suggestion.is_none());
    }

    #[test]
    fn test_hit_entity_ref() {
        let hit = SearchHit {
            entity_type: EntityType::new("blog", "post"),
            primary_key: "3".to_string(),
            score: Some(1.5),
            highlighted: None,
            fields: FieldMap::new(),
        };
        assert_eq!(hit.entity_ref().identifier(), "blog.post.3");
        assert!(hit.field("title").is_none());
    }
}

//! Result normalization.
//!
//! Turns a [`RawResponse`] into [`SearchResults`]: regroups facet arrays,
//! rebuilds pivot trees, picks the spelling collation and re-associates each
//! document with its registered entity schema so that stored fields can be
//! converted back to typed values.
//!
//! Documents whose entity type is not registered (or not indexed) are
//! skipped and subtracted from the engine's hit count. The count is an
//! approximation in that case; it is not recomputed with a filtered query.
//! A document with a missing or malformed type tag fails the whole response.

use serde_json::{Map, Value};

use crate::core::{RawFacetCounts, RawPivot, RawResponse, RawSpellcheck};
use crate::error::DecodeError;
use crate::schema::{EntitySchema, SchemaRegistry};
use crate::types::{
    EntityType, FacetCount, FacetCounts, FieldMap, Highlights, ID_FIELD, PK_FIELD, PivotFacet,
    ResultRecord, SCORE_FIELD, SearchHit, SearchResults, TYPE_FIELD,
};

use super::encoder::decode;

/// Converts raw engine responses into normalized results.
#[derive(Debug)]
pub struct ResultNormalizer<'a> {
    registry: &'a SchemaRegistry,
    include_spelling: bool,
}

impl<'a> ResultNormalizer<'a> {
    /// Creates a normalizer over a registry snapshot.
    pub fn new(registry: &'a SchemaRegistry, include_spelling: bool) -> Self {
        Self {
            registry,
            include_spelling,
        }
    }

    /// Normalizes a response, building one record per surviving document.
    pub fn normalize<R: ResultRecord>(
        &self,
        raw: RawResponse,
        highlight: bool,
    ) -> Result<SearchResults<R>, DecodeError> {
        let mut hits = raw.response.num_found;

        let facets = match &raw.facet_counts {
            Some(counts) => normalize_facets(counts)?,
            None => FacetCounts::default(),
        };

        let spelling_suggestion = if self.include_spelling {
            raw.spellcheck.as_ref().and_then(collated_suggestion)
        } else {
            None
        };

        let highlighting = if highlight { raw.highlighting } else { None };

        let mut results = Vec::with_capacity(raw.response.docs.len());
        for doc in &raw.response.docs {
            let Some((entity_type, schema)) = self.resolve(doc)? else {
                hits = hits.saturating_sub(1);
                continue;
            };

            let highlighted = highlighting.as_ref().and_then(|by_id| {
                doc.get(ID_FIELD)
                    .and_then(Value::as_str)
                    .and_then(|id| by_id.get(id))
                    .cloned()
            });

            let hit = self.build_hit(doc, entity_type, schema, highlighted)?;
            results.push(R::from_hit(hit));
        }

        Ok(SearchResults {
            results,
            hits,
            facets,
            spelling_suggestion,
        })
    }

    /// Looks up the document's schema. A well-formed type tag that is not
    /// registered or not indexed resolves to `None`; a missing or malformed
    /// tag is an error.
    fn resolve(
        &self,
        doc: &Map<String, Value>,
    ) -> Result<Option<(EntityType, &'a EntitySchema)>, DecodeError> {
        let tag = match doc.get(TYPE_FIELD) {
            Some(Value::String(tag)) => tag,
            Some(other) => {
                return Err(DecodeError::MalformedResponse {
                    message: format!("{} is not a string: {}", TYPE_FIELD, other),
                });
            }
            None => {
                return Err(DecodeError::MalformedResponse {
                    message: format!("document has no {}", TYPE_FIELD),
                });
            }
        };
        let entity_type =
            EntityType::parse(tag).ok_or_else(|| DecodeError::MalformedResponse {
                message: format!("invalid {} '{}'", TYPE_FIELD, tag),
            })?;
        Ok(self
            .registry
            .get_indexed(&entity_type)
            .map(|schema| (entity_type, schema)))
    }

    fn build_hit(
        &self,
        doc: &Map<String, Value>,
        entity_type: EntityType,
        schema: &EntitySchema,
        highlighted: Option<Highlights>,
    ) -> Result<SearchHit, DecodeError> {
        let primary_key = match doc.get(PK_FIELD) {
            Some(Value::String(pk)) => pk.clone(),
            Some(Value::Number(pk)) => pk.to_string(),
            _ => {
                return Err(DecodeError::MalformedResponse {
                    message: format!("document of type {} has no {}", entity_type, PK_FIELD),
                });
            }
        };
        let score = doc.get(SCORE_FIELD).and_then(Value::as_f64);

        let mut fields = FieldMap::new();
        for (key, value) in doc {
            if key == TYPE_FIELD || key == PK_FIELD || key == SCORE_FIELD {
                continue;
            }
            let (name, converted) = match schema.field_by_index_name(key) {
                Some(field) => {
                    let converted = match field.converter {
                        Some(convert) => convert(value)?,
                        None => decode(value, Some(field.field_type), key)?,
                    };
                    (field.name.clone(), converted)
                }
                None => (key.clone(), decode(value, None, key)?),
            };
            fields.insert(name, converted);
        }

        Ok(SearchHit {
            entity_type,
            primary_key,
            score,
            highlighted,
            fields,
        })
    }
}

/// Regroups the raw facet block into typed facet counts.
pub fn normalize_facets(raw: &RawFacetCounts) -> Result<FacetCounts, DecodeError> {
    let mut facets = FacetCounts::default();

    for (field, flat) in &raw.facet_fields {
        facets.fields.insert(field.clone(), regroup_pairs(field, flat)?);
    }

    for (field, buckets) in &raw.facet_dates {
        // gap/start/end entries carry strings, buckets carry counts
        let counts = buckets
            .iter()
            .filter_map(|(label, count)| count.as_u64().map(|c| FacetCount::new(label.clone(), c)))
            .collect();
        facets.dates.insert(field.clone(), counts);
    }

    facets.queries = raw.facet_queries.clone();

    for (path, pivots) in &raw.facet_pivot {
        facets.pivots.insert(path.clone(), convert_pivots(pivots));
    }

    Ok(facets)
}

fn regroup_pairs(field: &str, flat: &[Value]) -> Result<Vec<FacetCount>, DecodeError> {
    if flat.len() % 2 != 0 {
        return Err(DecodeError::MalformedResponse {
            message: format!("facet '{}' has an odd number of label/count entries", field),
        });
    }
    flat.chunks(2)
        .map(|pair| {
            let count = pair[1].as_u64().ok_or_else(|| DecodeError::MalformedResponse {
                message: format!("facet '{}' has a non-numeric count: {}", field, pair[1]),
            })?;
            Ok(FacetCount::new(label(&pair[0]), count))
        })
        .collect()
}

fn convert_pivots(pivots: &[RawPivot]) -> Vec<PivotFacet> {
    pivots
        .iter()
        .map(|p| PivotFacet {
            label: label(&p.value),
            count: p.count,
            children: p.pivot.as_deref().map(convert_pivots).unwrap_or_default(),
        })
        .collect()
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Picks the collated suggestion: the last entry of the suggestion list.
fn collated_suggestion(spellcheck: &RawSpellcheck) -> Option<String> {
    match spellcheck.suggestions.last()? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("collationQuery")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::schema::{FieldSchema, FieldType};
    use crate::types::FieldValue;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(
            EntitySchema::new(EntityType::new("blog", "post"))
                .with_field(FieldSchema::new("text", FieldType::Text).document())
                .with_field(FieldSchema::new("pub_date", FieldType::DateTime).with_index_name("pub_date_dt"))
                .with_field(FieldSchema::new("code", FieldType::Text).with_converter(upper)),
        );
        registry
    }

    fn upper(value: &Value) -> Result<FieldValue, DecodeError> {
        Ok(FieldValue::text(value.as_str().unwrap_or_default().to_uppercase()))
    }

    fn raw(body: Value) -> RawResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_documents_are_converted() {
        let registry = registry();
        let response = raw(json!({
            "response": {"numFound": 1, "docs": [{
                "id": "blog.post.7",
                "entity_type": "blog.post",
                "entity_id": "7",
                "score": 1.25,
                "text": "hello",
                "pub_date_dt": "2009-02-10T13:45:00Z",
                "code": "ab",
                "views": "12"
            }]}
        }));

        let results: SearchResults = ResultNormalizer::new(&registry, false)
            .normalize(response, false)
            .unwrap();
        assert_eq!(results.hits, 1);
        let hit = &results.results[0];
        assert_eq!(hit.primary_key, "7");
        assert_eq!(hit.score, Some(1.25));
        assert_eq!(
            hit.field("pub_date"),
            Some(&FieldValue::DateTime(Utc.with_ymd_and_hms(2009, 2, 10, 13, 45, 0).unwrap()))
        );
        assert_eq!(hit.field("code"), Some(&FieldValue::text("AB")));
        assert_eq!(hit.field("views"), Some(&FieldValue::Int(12)));
        assert_eq!(hit.field("id"), Some(&FieldValue::text("blog.post.7")));
        assert!(hit.field("entity_type").is_none());
        assert!(hit.field("entity_id").is_none());
        assert!(hit.field("score").is_none());
    }

    #[test]
    fn test_unregistered_documents_are_skipped() {
        let registry = registry();
        let response = raw(json!({
            "response": {"numFound": 3, "docs": [
                {"id": "blog.post.1", "entity_type": "blog.post", "entity_id": "1"},
                {"id": "shop.item.2", "entity_type": "shop.item", "entity_id": "2"},
                {"id": "shop.item.3", "entity_type": "shop.item", "entity_id": "3"}
            ]}
        }));

        let results: SearchResults = ResultNormalizer::new(&registry, false)
            .normalize(response, false)
            .unwrap();
        assert_eq!(results.hits, 1);
        assert_eq!(results.results.len(), 1);
    }

    #[test]
    fn test_malformed_type_tag_is_an_error() {
        let registry = registry();
        let docs = [
            json!({"id": "x", "entity_id": "3"}),
            json!({"id": "y", "entity_type": 42, "entity_id": "4"}),
            json!({"id": "z", "entity_type": "malformed", "entity_id": "5"}),
        ];
        for doc in docs {
            let response = raw(json!({"response": {"numFound": 1, "docs": [doc]}}));
            let err = ResultNormalizer::new(&registry, false)
                .normalize::<SearchHit>(response, false)
                .unwrap_err();
            assert!(matches!(err, DecodeError::MalformedResponse { .. }));
        }
    }

    #[test]
    fn test_decode_failure_propagates() {
        let registry = registry();
        let response = raw(json!({
            "response": {"numFound": 1, "docs": [{
                "entity_type": "blog.post", "entity_id": "1", "pub_date_dt": "yesterday"
            }]}
        }));
        let err = ResultNormalizer::new(&registry, false)
            .normalize::<SearchHit>(response, false)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { .. }));
    }

    #[test]
    fn test_facets() {
        let registry = registry();
        let response = raw(json!({
            "response": {"numFound": 0, "docs": []},
            "facet_counts": {
                "facet_fields": {"author": ["daniel", 3, "sam", 1]},
                "facet_dates": {"pub_date_dt": {
                    "2009-01-01T00:00:00Z": 4, "2009-02-01T00:00:00Z": 0,
                    "gap": "+1MONTH/MONTH", "start": "2009-01-01T00:00:00Z", "end": "2009-03-01T00:00:00Z"
                }},
                "facet_queries": {"author:daniel": 3},
                "facet_pivot": {"author,year": [
                    {"field": "author", "value": "daniel", "count": 3,
                     "pivot": [{"field": "year", "value": 2009, "count": 2}]}
                ]}
            }
        }));

        let results: SearchResults = ResultNormalizer::new(&registry, false)
            .normalize(response, false)
            .unwrap();
        let facets = results.facets;
        assert_eq!(
            facets.fields["author"],
            vec![FacetCount::new("daniel", 3), FacetCount::new("sam", 1)]
        );
        assert_eq!(facets.dates["pub_date_dt"].len(), 2);
        assert_eq!(facets.queries["author:daniel"], 3);
        assert_eq!(
            facets.pivots["author,year"],
            vec![PivotFacet {
                label: "daniel".to_string(),
                count: 3,
                children: vec![PivotFacet {
                    label: "2009".to_string(),
                    count: 2,
                    children: vec![],
                }],
            }]
        );
        assert_eq!(facets.dates["pub_date_dt"][0].label, "2009-01-01T00:00:00Z");
    }

    #[test]
    fn test_malformed_facet_pairs() {
        let counts = RawFacetCounts {
            facet_fields: BTreeMap::from([("author".to_string(), vec![json!("daniel")])]),
            ..Default::default()
        };
        assert!(normalize_facets(&counts).is_err());
    }

    #[test]
    fn test_spelling_and_highlighting() {
        let registry = registry();
        let body = json!({
            "response": {"numFound": 1, "docs": [
                {"id": "blog.post.1", "entity_type": "blog.post", "entity_id": "1"}
            ]},
            "highlighting": {"blog.post.1": {"text": ["<em>hello</em>"]}},
            "spellcheck": {"suggestions": ["helo", {"numFound": 1}, "collation", "hello"]}
        });

        let results: SearchResults = ResultNormalizer::new(&registry, true)
            .normalize(raw(body.clone()), true)
            .unwrap();
        assert_eq!(results.spelling_suggestion.as_deref(), Some("hello"));
        let highlighted = results.results[0].highlighted.as_ref().unwrap();
        assert_eq!(highlighted["text"], vec!["<em>hello</em>"]);

        let results: SearchResults = ResultNormalizer::new(&registry, false)
            .normalize(raw(body), false)
            .unwrap();
        assert!(results.spelling_suggestion.is_none());
        assert!(results.results[0].highlighted.is_none());
    }

    #[test]
    fn test_collation_object() {
        let spellcheck = RawSpellcheck {
            suggestions: vec![json!("collation"), json!({"collationQuery": "hello world"})],
        };
        assert_eq!(collated_suggestion(&spellcheck).as_deref(), Some("hello world"));
    }
}

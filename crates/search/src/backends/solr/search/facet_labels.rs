//! Facet label rewriting.
//!
//! Solr reports facets under physical field names. This maps them back to
//! the logical names callers asked for, using the facet mappings declared in
//! the schema.

use std::collections::BTreeMap;

use crate::schema::SchemaRegistry;
use crate::types::FacetCounts;

/// Maps a field or date facet key to its caller-facing name, keeping the raw
/// key when it has no facet mapping.
pub fn rewrite_key(registry: &SchemaRegistry, key: &str) -> String {
    registry
        .facet_name_for(key)
        .map_or_else(|| key.to_string(), str::to_string)
}

/// Maps a comma-joined pivot key to its caller-facing name.
///
/// Every component must have a facet mapping; otherwise the raw key is kept
/// unchanged.
pub fn rewrite_pivot_key(registry: &SchemaRegistry, key: &str) -> String {
    let mapped: Option<Vec<&str>> = key
        .split(',')
        .map(|component| registry.facet_name_for(component))
        .collect();
    match mapped {
        Some(names) => names.join(","),
        None => key.to_string(),
    }
}

fn rewrite_map<V>(
    registry: &SchemaRegistry,
    map: BTreeMap<String, V>,
    rewrite: fn(&SchemaRegistry, &str) -> String,
) -> BTreeMap<String, V> {
    map.into_iter()
        .map(|(key, value)| (rewrite(registry, &key), value))
        .collect()
}

/// Rewrites field, date and pivot facet keys. Query facet keys are the
/// queries themselves and stay as they are.
pub fn rewrite_facet_labels(registry: &SchemaRegistry, facets: FacetCounts) -> FacetCounts {
    FacetCounts {
        fields: rewrite_map(registry, facets.fields, rewrite_key),
        dates: rewrite_map(registry, facets.dates, rewrite_key),
        queries: facets.queries,
        pivots: rewrite_map(registry, facets.pivots, rewrite_pivot_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntitySchema, FieldSchema, FieldType};
    use crate::types::{EntityType, FacetCount, PivotFacet};

    fn registry(map_city: bool) -> SchemaRegistry {
        let mut schema = EntitySchema::new(EntityType::new("geo", "place"))
            .with_field(FieldSchema::facet("state", "st", FieldType::Text))
            .with_field(FieldSchema::new("city", FieldType::Text));
        if map_city {
            schema = schema.with_field(FieldSchema::facet("city", "ct", FieldType::Text));
        }
        let mut registry = SchemaRegistry::new();
        registry.register(schema);
        registry
    }

    #[test]
    fn test_pivot_key_fully_mapped() {
        assert_eq!(rewrite_pivot_key(&registry(true), "state,city"), "st,ct");
    }

    #[test]
    fn test_pivot_key_falls_back_when_any_component_unmapped() {
        assert_eq!(
            rewrite_pivot_key(&registry(false), "state,city"),
            "state,city"
        );
    }

    #[test]
    fn test_flat_keys() {
        let registry = registry(false);
        assert_eq!(rewrite_key(&registry, "state"), "st");
        assert_eq!(rewrite_key(&registry, "city"), "city");
        assert_eq!(rewrite_key(&registry, "unknown"), "unknown");
    }

    #[test]
    fn test_flat_key_with_comma_is_one_field() {
        let mut registry = registry(true);
        registry.register(
            EntitySchema::new(EntityType::new("geo", "region"))
                .with_field(FieldSchema::facet("zone,code", "zone", FieldType::Text)),
        );

        assert_eq!(rewrite_key(&registry, "zone,code"), "zone");
        assert_eq!(rewrite_key(&registry, "state,city"), "state,city");

        let mut facets = FacetCounts::default();
        facets
            .fields
            .insert("state,city".to_string(), vec![FacetCount::new("CA", 2)]);
        facets
            .dates
            .insert("zone,code".to_string(), vec![FacetCount::new("2009", 1)]);
        let rewritten = rewrite_facet_labels(&registry, facets);
        assert!(rewritten.fields.contains_key("state,city"));
        assert!(rewritten.dates.contains_key("zone"));
    }

    #[test]
    fn test_rewrite_facet_counts() {
        let mut facets = FacetCounts::default();
        facets
            .fields
            .insert("state".to_string(), vec![FacetCount::new("CA", 2)]);
        facets.queries.insert("state:CA".to_string(), 2);
        facets.pivots.insert(
            "state,city".to_string(),
            vec![PivotFacet {
                label: "CA".to_string(),
                count: 2,
                children: vec![],
            }],
        );

        let rewritten = rewrite_facet_labels(&registry(true), facets);
        assert!(rewritten.fields.contains_key("st"));
        assert!(rewritten.pivots.contains_key("st,ct"));
        assert!(rewritten.queries.contains_key("state:CA"));
    }
}

//! Facet request parameters.
//!
//! Renders the facet part of a [`QueryState`] as Solr parameters:
//! `facet.field`, `facet.date` with its per-field start/end/gap,
//! `facet.query`, `facet.pivot` and the global tuning knobs. Any facet sets
//! `facet=on`.

use crate::core::SolrParams;
use crate::schema::SchemaRegistry;
use crate::types::{FacetRequest, GapUnit, PivotFacetRequest, QueryState};

use super::encoder::encode;

/// Renders the `{!key=K ex=E}` local-parameter prefix.
///
/// Returns an empty string when neither a key nor exclusion tags are given.
pub fn local_params(key: Option<&str>, exclude: &[String]) -> String {
    let mut parts = Vec::with_capacity(2);
    if let Some(key) = key.filter(|k| !k.is_empty()) {
        parts.push(format!("key={}", key));
    }
    if !exclude.is_empty() {
        parts.push(format!("ex={}", exclude.join(",")));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{!{}}}", parts.join(" "))
    }
}

/// Renders a date facet gap such as `+1DAY/DAY` or `+3DAYS/DAY`.
pub fn date_gap(amount: u32, unit: GapUnit) -> String {
    let token = unit.token();
    let plural = if amount == 1 { "" } else { "S" };
    format!("+{}{}{}/{}", amount, token, plural, token)
}

/// Renders one field facet, resolving the facet field through the registry.
pub fn field_facet(registry: &SchemaRegistry, facet: &FacetRequest) -> String {
    format!(
        "{}{}",
        local_params(facet.key.as_deref(), &facet.exclude),
        registry.facet_field_name(&facet.field)
    )
}

/// Renders one pivot facet as a comma-joined field path.
pub fn pivot_facet(registry: &SchemaRegistry, facet: &PivotFacetRequest) -> String {
    let path: Vec<&str> = facet
        .fields
        .iter()
        .map(|field| registry.facet_field_name(field))
        .collect();
    format!(
        "{}{}",
        local_params(facet.key.as_deref(), &facet.exclude),
        path.join(",")
    )
}

/// Adds every facet parameter the state asks for.
pub fn apply_facets(params: &mut SolrParams, state: &QueryState, registry: &SchemaRegistry) {
    if !state.has_facets() {
        return;
    }
    params.set("facet", "on");

    for facet in &state.facets {
        params.push("facet.field", field_facet(registry, facet));
    }

    let options = &state.facet_options;
    if let Some(mincount) = options.mincount {
        params.set("facet.mincount", mincount.to_string());
    }
    if let Some(limit) = options.limit {
        params.set("facet.limit", limit.to_string());
    }
    for (field, limit) in &options.field_limits {
        params.set(
            format!("f.{}.facet.limit", registry.facet_field_name(field)),
            limit.to_string(),
        );
    }
    if let Some(prefix) = &options.prefix {
        params.set("facet.prefix", prefix.clone());
    }
    if let Some(sort) = &options.sort {
        params.set("facet.sort", sort.clone());
    }

    if !state.date_facets.is_empty() {
        params.set("facet.date.other", "none");
    }
    for (field, date_facet) in &state.date_facets {
        let index_field = registry.facet_field_name(field);
        params.push("facet.date", index_field);
        params.set(
            format!("f.{}.facet.date.start", index_field),
            encode(&date_facet.start),
        );
        params.set(
            format!("f.{}.facet.date.end", index_field),
            encode(&date_facet.end),
        );
        params.set(
            format!("f.{}.facet.date.gap", index_field),
            date_gap(date_facet.gap_amount, date_facet.gap_unit),
        );
    }

    for query_facet in &state.query_facets {
        params.push(
            "facet.query",
            format!(
                "{}:{}",
                registry.index_field_name(&query_facet.field),
                query_facet.value
            ),
        );
    }

    for facet in &state.pivot_facets {
        params.push("facet.pivot", pivot_facet(registry, facet));
    }
    if let Some(mincount) = options.pivot_mincount {
        params.set("facet.pivot.mincount", mincount.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntitySchema, FieldSchema, FieldType};
    use crate::types::EntityType;
    use chrono::NaiveDate;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(
            EntitySchema::new(EntityType::new("geo", "place"))
                .with_field(FieldSchema::new("state", FieldType::Text))
                .with_field(FieldSchema::facet("state_exact", "state", FieldType::Text))
                .with_field(FieldSchema::new("city", FieldType::Text))
                .with_field(FieldSchema::facet("city_exact", "city", FieldType::Text))
                .with_field(FieldSchema::new("founded", FieldType::Date)),
        );
        registry
    }

    #[test]
    fn test_local_params() {
        assert_eq!(local_params(None, &[]), "");
        assert_eq!(local_params(Some("by"), &[]), "{!key=by}");
        assert_eq!(local_params(None, &["t1".to_string()]), "{!ex=t1}");
        assert_eq!(
            local_params(Some("by"), &["t1".to_string(), "t2".to_string()]),
            "{!key=by ex=t1,t2}"
        );
    }

    #[test]
    fn test_date_gap() {
        assert_eq!(date_gap(1, GapUnit::Day), "+1DAY/DAY");
        assert_eq!(date_gap(3, GapUnit::Day), "+3DAYS/DAY");
        assert_eq!(date_gap(2, GapUnit::Month), "+2MONTHS/MONTH");
    }

    #[test]
    fn test_field_and_pivot_facets() {
        let mut state = QueryState::new("*:*");
        state.add_field_facet("state", None, &[]);
        state.add_field_facet("city", Some("town"), &["sel"]);
        state.add_pivot_facet(&["state", "city"], None, &[]);

        let mut params = SolrParams::new();
        apply_facets(&mut params, &state, &registry());

        assert_eq!(params.get("facet"), Some("on"));
        assert_eq!(
            params.get_all("facet.field"),
            vec!["state_exact", "{!key=town ex=sel}city_exact"]
        );
        assert_eq!(params.get_all("facet.pivot"), vec!["state_exact,city_exact"]);
    }

    #[test]
    fn test_date_facets() {
        let mut state = QueryState::new("*:*");
        state.add_date_facet(
            "founded",
            NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            10,
            GapUnit::Year,
        );

        let mut params = SolrParams::new();
        apply_facets(&mut params, &state, &registry());

        assert_eq!(params.get_all("facet.date"), vec!["founded"]);
        assert_eq!(params.get("facet.date.other"), Some("none"));
        assert_eq!(
            params.get("f.founded.facet.date.start"),
            Some("1900-01-01T00:00:00Z")
        );
        assert_eq!(params.get("f.founded.facet.date.end"), Some("2000-01-01T00:00:00Z"));
        assert_eq!(params.get("f.founded.facet.date.gap"), Some("+10YEARS/YEAR"));
    }

    #[test]
    fn test_query_facets_and_options() {
        let mut state = QueryState::new("*:*");
        state.add_query_facet("city", "[* TO *]");
        state.facet_options.mincount = Some(1);
        state.facet_options.field_limits.insert("state".to_string(), 5);
        state.facet_options.pivot_mincount = Some(2);

        let mut params = SolrParams::new();
        apply_facets(&mut params, &state, &registry());

        assert_eq!(params.get_all("facet.query"), vec!["city:[* TO *]"]);
        assert_eq!(params.get("facet.mincount"), Some("1"));
        assert_eq!(params.get("f.state_exact.facet.limit"), Some("5"));
        assert_eq!(params.get("facet.pivot.mincount"), Some("2"));
    }

    #[test]
    fn test_no_facets_leaves_params_untouched() {
        let mut params = SolrParams::new();
        apply_facets(&mut params, &QueryState::new("x"), &registry());
        assert!(params.is_empty());
    }
}

//! Search request assembly.
//!
//! [`RequestAssembler`] turns a [`QueryState`] into the query string and
//! parameter set sent to Solr's select handler. Relevance-tuning overrides
//! are merged last and win over anything computed before them.

use crate::core::SolrParams;
use crate::error::QueryError;
use crate::schema::SchemaRegistry;
use crate::types::{QueryState, SortDirection, SortDirective, TYPE_FIELD};

use super::facets::apply_facets;
use super::query_builder::build_query;

/// Dismax parameters Solr recognizes. Other keys are passed through as well.
pub const DISMAX_PARAMETERS: &[&str] = &[
    "defType", "qf", "q.alt", "mm", "pf", "ps", "qs", "tie", "bq", "bf", "boost",
];

/// Field list requested when the caller does not choose one.
pub const DEFAULT_FIELD_LIST: &str = "* score";

/// Highlight fragment size, in characters.
pub const HIGHLIGHT_FRAGSIZE: u32 = 200;

/// Process-wide search settings, injected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Request spelling suggestions with every search.
    pub include_spelling: bool,
    /// Restrict results to registered entity types unless a query overrides it.
    pub limit_to_registered_types: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            include_spelling: false,
            limit_to_registered_types: true,
        }
    }
}

/// A request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SolrRequest {
    /// The `q` parameter.
    pub query: String,
    /// Every other parameter.
    pub params: SolrParams,
}

/// Renders a sort specification such as `pub_date desc, title asc`.
pub fn sort_clause(registry: &SchemaRegistry, sort: &[SortDirective]) -> String {
    sort.iter()
        .map(|directive| {
            let direction = match directive.direction {
                SortDirection::Ascending => "asc",
                SortDirection::Descending => "desc",
            };
            format!("{} {}", registry.index_field_name(&directive.field), direction)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Narrowing clause restricting results to the indexed entity types, or
/// `None` when nothing is indexed.
pub fn registered_types_clause(registry: &SchemaRegistry) -> Option<String> {
    let types: Vec<String> = registry
        .indexed_types()
        .iter()
        .map(|t| t.to_string())
        .collect();
    if types.is_empty() {
        None
    } else {
        Some(format!("{}:({})", TYPE_FIELD, types.join(" OR ")))
    }
}

/// Builds Solr requests from query state.
#[derive(Debug)]
pub struct RequestAssembler<'a> {
    registry: &'a SchemaRegistry,
    settings: SearchSettings,
}

impl<'a> RequestAssembler<'a> {
    /// Creates an assembler over a registry snapshot.
    pub fn new(registry: &'a SchemaRegistry, settings: SearchSettings) -> Self {
        Self { registry, settings }
    }

    /// Whether the state asks for the registered-type restriction.
    pub fn limits_to_registered_types(&self, state: &QueryState) -> bool {
        state
            .limit_to_registered_types
            .unwrap_or(self.settings.limit_to_registered_types)
    }

    /// Assembles the request, or returns `None` when the query is empty and
    /// the engine should not be contacted.
    pub fn assemble(&self, state: &QueryState) -> Result<Option<SolrRequest>, QueryError> {
        state.validate()?;

        let query = build_query(state, self.registry)?;
        if query.is_empty() {
            return Ok(None);
        }

        let mut params = SolrParams::new();
        params.set(
            "fl",
            state.fields.as_deref().unwrap_or(DEFAULT_FIELD_LIST),
        );

        if !state.sort.is_empty() {
            params.set("sort", sort_clause(self.registry, &state.sort));
        }

        params.set("start", state.start_offset.to_string());
        if let Some(rows) = state.rows() {
            params.set("rows", rows.to_string());
        }

        if state.highlight {
            params.set("hl", "true");
            params.set("hl.fragsize", HIGHLIGHT_FRAGSIZE.to_string());
        }

        if self.settings.include_spelling {
            params.set("spellcheck", "true");
            params.set("spellcheck.collate", "true");
            params.set("spellcheck.count", "1");
            if let Some(spelling_query) = &state.spelling_query {
                params.set("spellcheck.q", spelling_query.clone());
            }
        }

        apply_facets(&mut params, state, self.registry);

        if self.limits_to_registered_types(state) {
            if let Some(clause) = registered_types_clause(self.registry) {
                params.push("fq", clause);
            }
        }

        for narrow in &state.narrow_queries {
            if narrow.tags.is_empty() {
                params.push("fq", narrow.query.clone());
            } else {
                params.push(
                    "fq",
                    format!("{{!tag={}}}{}", narrow.tags.join(","), narrow.query),
                );
            }
        }

        for (key, value) in &state.dismax {
            params.set(key.clone(), value.clone());
        }

        Ok(Some(SolrRequest { query, params }))
    }
}

//! Query state.
//!
//! [`QueryState`] collects everything a caller can ask of a search: the base
//! query text, structured filters, sorting, pagination, faceting,
//! highlighting, spelling and relevance tuning. It is compiled once into an
//! engine request by the backend.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

use super::entity::EntityRef;
use super::value::FieldValue;

/// Separator between a field name and its operator in lookup strings.
pub const LOOKUP_SEPARATOR: &str = "__";

/// Filter operators understood by the query compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Field equals value.
    #[default]
    Exact,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Prefix match.
    StartsWith,
    /// Membership in a set of values.
    In,
    /// Inclusive range between two bounds.
    Range,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterOperator::Exact => "exact",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::StartsWith => "startswith",
            FilterOperator::In => "in",
            FilterOperator::Range => "range",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(FilterOperator::Exact),
            "gt" => Ok(FilterOperator::Gt),
            "gte" => Ok(FilterOperator::Gte),
            "lt" => Ok(FilterOperator::Lt),
            "lte" => Ok(FilterOperator::Lte),
            "startswith" => Ok(FilterOperator::StartsWith),
            "in" => Ok(FilterOperator::In),
            "range" => Ok(FilterOperator::Range),
            _ => Err(QueryError::UnsupportedOperator {
                operator: s.to_string(),
            }),
        }
    }
}

/// How a filter joins the clauses before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Connector {
    /// Both must match.
    #[default]
    And,
    /// Either may match.
    Or,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connector::And => write!(f, "AND"),
            Connector::Or => write!(f, "OR"),
        }
    }
}

/// One structured filter predicate on a logical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Logical field name (or [`CONTENT_FIELD`](super::entity::CONTENT_FIELD)).
    pub field: String,
    /// Comparison operator.
    pub operator: FilterOperator,
    /// Value to compare against.
    pub value: FieldValue,
    /// How this filter joins the preceding clauses.
    pub connector: Connector,
    /// Whether the clause is negated.
    pub negated: bool,
}

impl Filter {
    /// Creates an AND-joined filter.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            connector: Connector::And,
            negated: false,
        }
    }

    /// Creates a filter from a `field__operator` lookup such as `price__gte`.
    ///
    /// A lookup without an operator suffix means `exact`.
    pub fn lookup(lookup: &str, value: impl Into<FieldValue>) -> Result<Self, QueryError> {
        let (field, operator) = match lookup.rsplit_once(LOOKUP_SEPARATOR) {
            Some((field, op)) => (field, op.parse::<FilterOperator>()?),
            None => (lookup, FilterOperator::Exact),
        };
        Ok(Self::new(field, operator, value))
    }

    /// Joins this filter with OR instead of AND.
    pub fn or(mut self) -> Self {
        self.connector = Connector::Or;
        self
    }

    /// Negates this filter.
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

/// A sort directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    /// The logical field to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl SortDirective {
    /// Parses a sort key (e.g., "-pub_date" for descending).
    pub fn parse(s: &str) -> Self {
        if let Some(stripped) = s.strip_prefix('-') {
            Self {
                field: stripped.to_string(),
                direction: SortDirection::Descending,
            }
        } else {
            Self {
                field: s.to_string(),
                direction: SortDirection::Ascending,
            }
        }
    }
}

/// A field facet, optionally renamed and excluding tagged narrowing clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetRequest {
    /// Logical field to facet on.
    pub field: String,
    /// Result key to report the facet under.
    pub key: Option<String>,
    /// Tags of narrowing clauses to ignore while counting.
    pub exclude: Vec<String>,
}

/// A pivot facet across several fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotFacetRequest {
    /// Logical fields, outermost first.
    pub fields: Vec<String>,
    /// Result key to report the facet under.
    pub key: Option<String>,
    /// Tags of narrowing clauses to ignore while counting.
    pub exclude: Vec<String>,
}

/// Unit of a date facet gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapUnit {
    /// Years.
    Year,
    /// Months.
    Month,
    /// Days.
    Day,
    /// Hours.
    Hour,
    /// Minutes.
    Minute,
    /// Seconds.
    Second,
}

impl GapUnit {
    /// Upper-cased engine token for this unit.
    pub fn token(&self) -> &'static str {
        match self {
            GapUnit::Year => "YEAR",
            GapUnit::Month => "MONTH",
            GapUnit::Day => "DAY",
            GapUnit::Hour => "HOUR",
            GapUnit::Minute => "MINUTE",
            GapUnit::Second => "SECOND",
        }
    }
}

impl FromStr for GapUnit {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "year" => Ok(GapUnit::Year),
            "month" => Ok(GapUnit::Month),
            "day" => Ok(GapUnit::Day),
            "hour" => Ok(GapUnit::Hour),
            "minute" => Ok(GapUnit::Minute),
            "second" => Ok(GapUnit::Second),
            other => Err(QueryError::InvalidFilterValue {
                field: "gap_by".to_string(),
                operator: "date_facet".to_string(),
                message: format!("unknown gap unit '{}'", other),
            }),
        }
    }
}

/// A date facet bucketed by a fixed gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateFacetRequest {
    /// First bucket start.
    pub start: FieldValue,
    /// Last bucket end.
    pub end: FieldValue,
    /// Number of units per bucket.
    pub gap_amount: u32,
    /// Unit of each bucket.
    pub gap_unit: GapUnit,
}

/// A facet counting documents that match `field:value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFacet {
    /// Logical field.
    pub field: String,
    /// Raw query value.
    pub value: String,
}

/// A narrowing clause, rendered verbatim, optionally tagged for facet exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrowQuery {
    /// Raw clause text.
    pub query: String,
    /// Tags attached to the clause.
    pub tags: Vec<String>,
}

/// Faceting knobs that apply to the whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOptions {
    /// Minimum count for a bucket to be returned.
    pub mincount: Option<u32>,
    /// Maximum buckets per field facet.
    pub limit: Option<i64>,
    /// Per-field bucket limits, keyed by logical field.
    pub field_limits: BTreeMap<String, i64>,
    /// Only return buckets whose label starts with this prefix.
    pub prefix: Option<String>,
    /// Bucket ordering (`count` or `index`).
    pub sort: Option<String>,
    /// Minimum count for pivot buckets.
    pub pivot_mincount: Option<u32>,
}

impl FacetOptions {
    /// Returns true if any option is set.
    pub fn is_set(&self) -> bool {
        self.mincount.is_some()
            || self.limit.is_some()
            || !self.field_limits.is_empty()
            || self.prefix.is_some()
            || self.sort.is_some()
            || self.pivot_mincount.is_some()
    }
}

/// Mutable, caller-owned description of one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    /// Base query string, used verbatim.
    pub query: String,
    /// User-entered text, escaped before use.
    pub auto_query: Option<String>,
    /// Structured filters, compiled against the schema.
    pub filters: Vec<Filter>,
    /// Sort keys in priority order.
    pub sort: Vec<SortDirective>,
    /// Field facets.
    pub facets: Vec<FacetRequest>,
    /// Pivot facets.
    pub pivot_facets: Vec<PivotFacetRequest>,
    /// Date facets keyed by logical field.
    pub date_facets: BTreeMap<String, DateFacetRequest>,
    /// Query facets.
    pub query_facets: Vec<QueryFacet>,
    /// Faceting knobs.
    pub facet_options: FacetOptions,
    /// Narrowing clauses.
    pub narrow_queries: Vec<NarrowQuery>,
    /// Offset of the first result.
    pub start_offset: usize,
    /// Offset one past the last result.
    pub end_offset: Option<usize>,
    /// Whether to request highlighting.
    pub highlight: bool,
    /// Explicit field list to return.
    pub fields: Option<String>,
    /// Relevance-tuning overrides, merged last.
    pub dismax: BTreeMap<String, String>,
    /// Alternate text to compute spelling suggestions for.
    pub spelling_query: Option<String>,
    /// Target entity for more-like-this.
    pub more_like_this: Option<EntityRef>,
    /// Per-query override of the registered-type restriction.
    pub limit_to_registered_types: Option<bool>,
}

impl QueryState {
    /// Creates a query state with the given base query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Creates a query state that matches every document.
    pub fn match_all() -> Self {
        Self::new("*:*")
    }

    /// Sets user-entered text to search for; reserved syntax is escaped.
    pub fn auto_query(mut self, text: impl Into<String>) -> Self {
        self.auto_query = Some(text.into());
        self
    }

    /// Adds a filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a sort key; a leading `-` sorts descending.
    pub fn order_by(mut self, key: &str) -> Self {
        self.sort.push(SortDirective::parse(key));
        self
    }

    /// Adds a field facet. Duplicate requests are ignored.
    pub fn add_field_facet(&mut self, field: impl Into<String>, key: Option<&str>, exclude: &[&str]) {
        let facet = FacetRequest {
            field: field.into(),
            key: key.map(str::to_string),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        };
        if !self.facets.contains(&facet) {
            self.facets.push(facet);
        }
    }

    /// Adds a pivot facet over the given fields. Duplicate requests are ignored.
    pub fn add_pivot_facet(&mut self, fields: &[&str], key: Option<&str>, exclude: &[&str]) {
        let facet = PivotFacetRequest {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            key: key.map(str::to_string),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        };
        if !self.pivot_facets.contains(&facet) {
            self.pivot_facets.push(facet);
        }
    }

    /// Adds (or replaces) a date facet on a field.
    pub fn add_date_facet(
        &mut self,
        field: impl Into<String>,
        start: impl Into<FieldValue>,
        end: impl Into<FieldValue>,
        gap_amount: u32,
        gap_unit: GapUnit,
    ) {
        self.date_facets.insert(
            field.into(),
            DateFacetRequest {
                start: start.into(),
                end: end.into(),
                gap_amount,
                gap_unit,
            },
        );
    }

    /// Adds a query facet.
    pub fn add_query_facet(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.query_facets.push(QueryFacet {
            field: field.into(),
            value: value.into(),
        });
    }

    /// Adds a narrowing clause. Duplicate clauses are ignored.
    pub fn add_narrow_query(&mut self, query: impl Into<String>, tags: &[&str]) {
        let narrow = NarrowQuery {
            query: query.into(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
        };
        if !self.narrow_queries.contains(&narrow) {
            self.narrow_queries.push(narrow);
        }
    }

    /// Sets the result window.
    pub fn with_offsets(mut self, start: usize, end: Option<usize>) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }

    /// Requests highlighting.
    pub fn with_highlight(mut self) -> Self {
        self.highlight = true;
        self
    }

    /// Sets the explicit field list.
    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Adds a relevance-tuning override.
    pub fn with_dismax(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dismax.insert(key.into(), value.into());
        self
    }

    /// Sets the text used for spelling suggestions.
    pub fn with_spelling_query(mut self, text: impl Into<String>) -> Self {
        self.spelling_query = Some(text.into());
        self
    }

    /// Targets a more-like-this search at the entity.
    pub fn with_more_like_this(mut self, entity: EntityRef) -> Self {
        self.more_like_this = Some(entity);
        self
    }

    /// Overrides the configured registered-type restriction for this query.
    pub fn with_limit_to_registered_types(mut self, limit: bool) -> Self {
        self.limit_to_registered_types = Some(limit);
        self
    }

    /// Returns true if any faceting was requested.
    pub fn has_facets(&self) -> bool {
        !self.facets.is_empty()
            || !self.pivot_facets.is_empty()
            || !self.date_facets.is_empty()
            || !self.query_facets.is_empty()
            || self.facet_options.is_set()
    }

    /// Number of rows to request, if the window is bounded.
    pub fn rows(&self) -> Option<usize> {
        self.end_offset
            .map(|end| end.saturating_sub(self.start_offset))
    }

    /// Checks the state's invariants before compilation.
    pub fn validate(&self) -> Result<(), QueryError> {
        if let Some(end) = self.end_offset {
            if end < self.start_offset {
                return Err(QueryError::InvalidPagination {
                    start: self.start_offset,
                    end,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse() {
        assert_eq!("gte".parse::<FilterOperator>().unwrap(), FilterOperator::Gte);
        assert_eq!(
            "startswith".parse::<FilterOperator>().unwrap(),
            FilterOperator::StartsWith
        );
        let err = "near".parse::<FilterOperator>().unwrap_err();
        assert_eq!(
            err,
            QueryError::UnsupportedOperator {
                operator: "near".to_string()
            }
        );
    }

    #[test]
    fn test_filter_lookup() {
        let filter = Filter::lookup("price__gte", 10).unwrap();
        assert_eq!(filter.field, "price");
        assert_eq!(filter.operator, FilterOperator::Gte);

        let filter = Filter::lookup("title", "hello").unwrap();
        assert_eq!(filter.operator, FilterOperator::Exact);

        assert!(Filter::lookup("price__about", 10).is_err());
    }

    #[test]
    fn test_sort_parse() {
        let sort = SortDirective::parse("-pub_date");
        assert_eq!(sort.field, "pub_date");
        assert_eq!(sort.direction, SortDirection::Descending);

        let sort = SortDirective::parse("title");
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_facets_are_deduplicated() {
        let mut state = QueryState::new("hello");
        state.add_field_facet("author", None, &[]);
        state.add_field_facet("author", None, &[]);
        state.add_field_facet("author", Some("by"), &[]);
        assert_eq!(state.facets.len(), 2);

        state.add_narrow_query("author:daniel", &[]);
        state.add_narrow_query("author:daniel", &[]);
        assert_eq!(state.narrow_queries.len(), 1);
    }

    #[test]
    fn test_rows_and_validate() {
        let state = QueryState::new("x").with_offsets(10, Some(30));
        assert_eq!(state.rows(), Some(20));
        assert!(state.validate().is_ok());

        let state = QueryState::new("x").with_offsets(30, Some(10));
        assert!(matches!(
            state.validate(),
            Err(QueryError::InvalidPagination { start: 30, end: 10 })
        ));

        assert_eq!(QueryState::new("x").rows(), None);
    }

    #[test]
    fn test_has_facets() {
        let mut state = QueryState::new("x");
        assert!(!state.has_facets());
        state.add_query_facet("author", "daniel");
        assert!(state.has_facets());
    }

    #[test]
    fn test_gap_unit() {
        assert_eq!("Day".parse::<GapUnit>().unwrap(), GapUnit::Day);
        assert_eq!(GapUnit::Month.token(), "MONTH");
        assert!("fortnight".parse::<GapUnit>().is_err());
    }
}

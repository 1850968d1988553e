//! Solr query compilation.
//!
//! Compiles structured [`Filter`]s into Lucene query clauses and combines
//! them with the base query into the final `q` string.
//!
//! | Operator | Clause |
//! |----------|--------|
//! | `exact` | `F:V` |
//! | `gt` | `F:{V TO *}` |
//! | `gte` | `F:[V TO *]` |
//! | `lt` | `F:{* TO V}` |
//! | `lte` | `F:[* TO V]` |
//! | `startswith` | `F:V*` |
//! | `in` | `(F:"v1" OR F:"v2")` |
//! | `range` | `F:[A TO B]` |
//!
//! Values are not escaped here; only auto queries are.

use crate::error::QueryError;
use crate::schema::SchemaRegistry;
use crate::types::{CONTENT_FIELD, Connector, FieldValue, Filter, FilterOperator, QueryState};

use super::encoder::{encode, escape_reserved};

/// Compiles one filter predicate into a query clause.
///
/// `field` is a logical name resolved to its index name through the
/// registry; [`CONTENT_FIELD`] compiles to a bare value with no field prefix.
pub fn compile(
    registry: &SchemaRegistry,
    field: &str,
    operator: FilterOperator,
    value: &FieldValue,
) -> Result<String, QueryError> {
    let index_field = registry.index_field_name(field);
    let invalid = |message: &str| QueryError::InvalidFilterValue {
        field: field.to_string(),
        operator: operator.to_string(),
        message: message.to_string(),
    };

    let single = || -> Result<String, QueryError> {
        if matches!(value, FieldValue::Null) {
            return Err(invalid("value is null"));
        }
        if value.is_list() {
            return Err(invalid("expected a single value"));
        }
        let literal = encode(value);
        if literal.chars().any(char::is_whitespace) {
            Ok(format!("\"{}\"", literal))
        } else {
            Ok(literal)
        }
    };

    if field == CONTENT_FIELD && !matches!(operator, FilterOperator::In | FilterOperator::Range) {
        return single();
    }

    let clause = match operator {
        FilterOperator::Exact => format!("{}:{}", index_field, single()?),
        FilterOperator::Gt => format!("{}:{{{} TO *}}", index_field, single()?),
        FilterOperator::Gte => format!("{}:[{} TO *]", index_field, single()?),
        FilterOperator::Lt => format!("{}:{{* TO {}}}", index_field, single()?),
        FilterOperator::Lte => format!("{}:[* TO {}]", index_field, single()?),
        FilterOperator::StartsWith => format!("{}:{}*", index_field, single()?),
        FilterOperator::In => {
            let values = value
                .as_list()
                .filter(|values| !values.is_empty())
                .ok_or_else(|| invalid("expected a non-empty list of values"))?;
            let options: Vec<String> = values
                .iter()
                .map(|v| format!("{}:\"{}\"", index_field, encode(v)))
                .collect();
            format!("({})", options.join(" OR "))
        }
        FilterOperator::Range => {
            let bounds = value
                .as_list()
                .filter(|bounds| bounds.len() == 2)
                .ok_or_else(|| invalid("expected exactly two bounds"))?;
            format!(
                "{}:[{} TO {}]",
                index_field,
                encode(&bounds[0]),
                encode(&bounds[1])
            )
        }
    };
    Ok(clause)
}

/// Compiles a filter, applying its negation.
pub fn compile_filter(registry: &SchemaRegistry, filter: &Filter) -> Result<String, QueryError> {
    let clause = compile(registry, &filter.field, filter.operator, &filter.value)?;
    if filter.negated {
        Ok(format!("NOT ({})", clause))
    } else {
        Ok(clause)
    }
}

/// Builds the final query string from the base query, the auto query and
/// the filters.
///
/// Clauses are joined left to right with each filter's connector; the
/// accumulated expression is parenthesized whenever the connector changes.
/// Returns an empty string when there is nothing to search for.
pub fn build_query(state: &QueryState, registry: &SchemaRegistry) -> Result<String, QueryError> {
    let base = match &state.auto_query {
        Some(text) => escape_reserved(text),
        None => state.query.trim().to_string(),
    };

    let mut query = base;
    let mut last: Option<Connector> = None;

    for filter in &state.filters {
        let clause = compile_filter(registry, filter)?;
        if query.is_empty() {
            query = clause;
            continue;
        }
        if last.is_some_and(|prev| prev != filter.connector) {
            query = format!("({})", query);
        }
        query = format!("{} {} {}", query, filter.connector, clause);
        last = Some(filter.connector);
    }

    Ok(query)
}

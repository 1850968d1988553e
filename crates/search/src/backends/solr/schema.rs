//! Solr schema generation.
//!
//! Maps field schemas to `<field>` declarations for Solr's `schema.xml`.

use std::collections::HashSet;

use crate::core::SchemaField;
use crate::schema::{FieldSchema, FieldType};

/// Solr field type for a declared field type.
fn solr_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Date | FieldType::DateTime => "date",
        FieldType::Integer => "long",
        FieldType::Float => "float",
        FieldType::Boolean => "boolean",
        FieldType::NGram => "ngram",
        FieldType::EdgeNGram => "edge_ngram",
        FieldType::Text => "text",
    }
}

/// Builds schema declarations for the given fields.
///
/// Returns the index name of the content field (empty when none is marked
/// as the document field) and one declaration per distinct index name.
/// Fields that are not indexed, and facet fields, use the non-analyzed
/// `string` type instead of `text`.
pub fn build_schema(fields: &[FieldSchema]) -> (String, Vec<SchemaField>) {
    let mut content_field_name = String::new();
    let mut seen = HashSet::new();
    let mut schema_fields = Vec::new();

    for field in fields {
        if field.document {
            content_field_name = field.index_name.clone();
        }
        if !seen.insert(field.index_name.as_str()) {
            continue;
        }

        let mut field_type = solr_type(field.field_type);

        if !field.indexed && field_type == "text" {
            field_type = "string";
        }
        if field.is_facet() && field_type == "text" {
            field_type = "string";
        }

        schema_fields.push(SchemaField {
            field_name: field.index_name.clone(),
            field_type: field_type.to_string(),
            indexed: field.indexed,
            stored: field.stored,
            multi_valued: field.multi_valued,
        });
    }

    (content_field_name, schema_fields)
}

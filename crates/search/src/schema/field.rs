//! Field descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::FieldValue;

/// Declared type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Analyzed text.
    #[default]
    Text,
    /// Calendar date.
    Date,
    /// Timestamp.
    DateTime,
    /// Integer.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean.
    Boolean,
    /// Text analyzed into n-grams.
    NGram,
    /// Text analyzed into edge n-grams.
    EdgeNGram,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::NGram => "ngram",
            FieldType::EdgeNGram => "edge_ngram",
        };
        write!(f, "{}", name)
    }
}

/// Field-specific conversion from a raw engine value.
///
/// Fields without one are decoded by the generic decoder.
pub type Converter = fn(&Value) -> Result<FieldValue, DecodeError>;

/// Describes one indexed field of an entity type.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// Logical name used by callers.
    pub name: String,
    /// Physical name in the index.
    pub index_name: String,
    /// Declared type.
    pub field_type: FieldType,
    /// Whether the field holds multiple values.
    pub multi_valued: bool,
    /// Whether the engine stores the value for retrieval.
    pub stored: bool,
    /// Whether the engine indexes the value for searching.
    pub indexed: bool,
    /// Whether this is the primary content field.
    pub document: bool,
    /// For facet fields, the logical field they facet for.
    pub facet_for: Option<String>,
    /// Optional value converter.
    pub converter: Option<Converter>,
}

impl FieldSchema {
    /// Creates a stored, indexed, single-valued field whose index name equals its logical name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            index_name: name.clone(),
            name,
            field_type,
            multi_valued: false,
            stored: true,
            indexed: true,
            document: false,
            facet_for: None,
            converter: None,
        }
    }

    /// Creates a facet field that reports its buckets under `facet_for`.
    pub fn facet(name: impl Into<String>, facet_for: impl Into<String>, field_type: FieldType) -> Self {
        let mut field = Self::new(name, field_type);
        field.facet_for = Some(facet_for.into());
        field
    }

    /// Sets the physical index name.
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    /// Marks the field multi-valued.
    pub fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    /// Marks the field as not stored.
    pub fn not_stored(mut self) -> Self {
        self.stored = false;
        self
    }

    /// Marks the field as not indexed.
    pub fn not_indexed(mut self) -> Self {
        self.indexed = false;
        self
    }

    /// Marks the field as the primary content field.
    pub fn document(mut self) -> Self {
        self.document = true;
        self
    }

    /// Attaches a value converter.
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Returns true for facet fields.
    pub fn is_facet(&self) -> bool {
        self.facet_for.is_some()
    }

    /// The caller-facing name facet buckets are reported under, if this is a facet field.
    pub fn facet_name(&self) -> Option<&str> {
        self.facet_for.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(value: &Value) -> Result<FieldValue, DecodeError> {
        Ok(FieldValue::text(value.as_str().unwrap_or_default().to_uppercase()))
    }

    #[test]
    fn test_field_defaults() {
        let field = FieldSchema::new("title", FieldType::Text);
        assert_eq!(field.index_name, "title");
        assert!(field.stored);
        assert!(field.indexed);
        assert!(!field.multi_valued);
        assert!(!field.is_facet());
    }

    #[test]
    fn test_facet_field() {
        let field = FieldSchema::facet("author_exact", "author", FieldType::Text);
        assert!(field.is_facet());
        assert_eq!(field.facet_name(), Some("author"));
    }

    #[test]
    fn test_converter() {
        let field = FieldSchema::new("code", FieldType::Text).with_converter(upper);
        let convert = field.converter.unwrap();
        assert_eq!(
            convert(&Value::String("ab".to_string())).unwrap(),
            FieldValue::text("AB")
        );
    }
}

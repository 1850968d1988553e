//! Entity schema registry.
//!
//! The registry holds the field schemas of every registered entity type and
//! tracks which of them are currently indexed. It answers the lookups the
//! query compiler and result normalizer need: logical to physical field
//! names, facet field names, and per-field converters.

use std::collections::BTreeMap;

use crate::error::{PrepareError, QueryError};
use crate::types::{EntityRef, EntityType, FieldMap};

use super::field::FieldSchema;

/// The schema of one entity type.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    /// The entity type.
    pub entity_type: EntityType,
    /// Indexed fields.
    pub fields: Vec<FieldSchema>,
    /// Whether documents of this type are currently searchable.
    pub indexed: bool,
}

impl EntitySchema {
    /// Creates an indexed schema with no fields.
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            fields: Vec::new(),
            indexed: true,
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the primary content field.
    pub fn content_field(&self) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.document)
    }

    /// Finds a field by logical name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Finds a field by physical index name.
    pub fn field_by_index_name(&self, index_name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.index_name == index_name)
    }
}

/// Supplies documents for one entity type.
///
/// Implemented by the application for each kind of entity it indexes.
pub trait EntityIndex: Send + Sync {
    /// The application's entity type.
    type Entity: Send + Sync;

    /// The entity type this index covers.
    fn entity_type(&self) -> EntityType;

    /// The entity's primary key.
    fn primary_key(&self, entity: &Self::Entity) -> String;

    /// Converts an entity into field values keyed by physical field name.
    fn prepare(&self, entity: &Self::Entity) -> Result<FieldMap, PrepareError>;

    /// Index-time boosts per physical field.
    fn field_boosts(&self) -> BTreeMap<String, f32> {
        BTreeMap::new()
    }

    /// Reference to the entity.
    fn entity_ref(&self, entity: &Self::Entity) -> EntityRef {
        EntityRef::new(self.entity_type(), self.primary_key(entity))
    }
}

/// In-memory registry of entity schemas.
pub struct SchemaRegistry {
    schemas: BTreeMap<EntityType, EntitySchema>,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("entity_types", &self.schemas.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            schemas: BTreeMap::new(),
        }
    }

    /// Number of registered entity types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registers a schema, replacing any previous one for the same type.
    pub fn register(&mut self, schema: EntitySchema) -> Option<EntitySchema> {
        self.schemas.insert(schema.entity_type.clone(), schema)
    }

    /// Removes a schema.
    pub fn unregister(&mut self, entity_type: &EntityType) -> Result<EntitySchema, QueryError> {
        self.schemas
            .remove(entity_type)
            .ok_or_else(|| QueryError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            })
    }

    /// Turns indexing of an entity type on or off.
    pub fn set_indexed(&mut self, entity_type: &EntityType, indexed: bool) -> Result<(), QueryError> {
        let schema = self
            .schemas
            .get_mut(entity_type)
            .ok_or_else(|| QueryError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            })?;
        schema.indexed = indexed;
        Ok(())
    }

    /// Returns the schema of an entity type.
    pub fn get(&self, entity_type: &EntityType) -> Option<&EntitySchema> {
        self.schemas.get(entity_type)
    }

    /// Returns the schema of an entity type only if it is currently indexed.
    pub fn get_indexed(&self, entity_type: &EntityType) -> Option<&EntitySchema> {
        self.schemas.get(entity_type).filter(|s| s.indexed)
    }

    /// Currently indexed entity types, in sorted order.
    pub fn indexed_types(&self) -> Vec<EntityType> {
        self.schemas
            .values()
            .filter(|s| s.indexed)
            .map(|s| s.entity_type.clone())
            .collect()
    }

    /// Iterates over every field of every registered schema.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.schemas.values().flat_map(|s| s.fields.iter())
    }

    /// Physical name of the primary content field.
    pub fn content_field_name(&self) -> Option<&str> {
        self.all_fields()
            .find(|f| f.document)
            .map(|f| f.index_name.as_str())
    }

    /// Physical name for a logical field; unknown names pass through.
    pub fn index_field_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.all_fields()
            .find(|f| f.name == name)
            .map(|f| f.index_name.as_str())
            .unwrap_or(name)
    }

    /// Physical name of the field to facet on for a logical field.
    ///
    /// Prefers a dedicated facet field declared for `name`, then the field
    /// itself; unknown names pass through.
    pub fn facet_field_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.all_fields()
            .find(|f| f.facet_for.as_deref() == Some(name))
            .map(|f| f.index_name.as_str())
            .unwrap_or_else(|| self.index_field_name(name))
    }

    /// Caller-facing facet name for a physical field, if it is a facet field.
    pub fn facet_name_for(&self, index_name: &str) -> Option<&str> {
        self.all_fields()
            .filter(|f| f.index_name == index_name)
            .find_map(|f| f.facet_name())
    }
}

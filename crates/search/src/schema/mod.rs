//! Entity and field schemas.
//!
//! The schema layer declares which entity types are searchable and which
//! fields they carry. The backend only reads it.

mod field;
mod registry;

pub use field::{Converter, FieldSchema, FieldType};
pub use registry::{EntityIndex, EntitySchema, SchemaRegistry};

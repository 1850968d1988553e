//! Entity identity in the index.
//!
//! Every indexed document carries its entity type (`namespace.kind`) and the
//! entity's primary key in reserved fields, plus a unique document identifier
//! of the form `namespace.kind.pk`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Reserved field holding the unique document identifier.
pub const ID_FIELD: &str = "id";

/// Reserved field holding the `namespace.kind` entity type tag.
pub const TYPE_FIELD: &str = "entity_type";

/// Reserved field holding the entity's primary key.
pub const PK_FIELD: &str = "entity_id";

/// Relevance score field returned by the engine.
pub const SCORE_FIELD: &str = "score";

/// Reserved logical field name meaning "the primary content field".
pub const CONTENT_FIELD: &str = "content";

/// The type of an indexed entity, e.g. `blog.post`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityType {
    /// Namespace (application) the entity belongs to.
    pub namespace: String,
    /// Kind of entity within the namespace.
    pub kind: String,
}

impl EntityType {
    /// Creates a new entity type.
    pub fn new(namespace: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.into(),
        }
    }

    /// Splits a raw `namespace.kind` tag. Returns `None` if the tag is not
    /// made of exactly two non-empty parts.
    pub fn parse(tag: &str) -> Option<Self> {
        let (namespace, kind) = tag.split_once('.')?;
        if namespace.is_empty() || kind.is_empty() || kind.contains('.') {
            return None;
        }
        Some(Self::new(namespace, kind))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.kind)
    }
}

impl FromStr for EntityType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| QueryError::UnknownEntityType {
            entity_type: s.to_string(),
        })
    }
}

/// A reference to one indexed entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// The entity's type.
    pub entity_type: EntityType,
    /// The entity's primary key.
    pub primary_key: String,
}

impl EntityRef {
    /// Creates a new entity reference.
    pub fn new(entity_type: EntityType, primary_key: impl Into<String>) -> Self {
        Self {
            entity_type,
            primary_key: primary_key.into(),
        }
    }

    /// Returns the unique document identifier, `namespace.kind.pk`.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.entity_type, self.primary_key)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

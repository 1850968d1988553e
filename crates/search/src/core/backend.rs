//! Backend façade contract.
//!
//! [`SearchBackend`] is what a search service talks to. It is object safe so
//! that connections can be registered under aliases as
//! `Arc<dyn SearchBackend>`; entity preparation happens up front in an
//! [`IndexBatch`] so that `update` needs no generic parameter.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{PrepareError, SearchResult};
use crate::schema::{EntityIndex, FieldSchema};
use crate::types::{EntityRef, EntityType, FieldMap, QueryState, SearchHit, SearchResults};

/// A schema field as the engine should declare it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// Physical field name.
    pub field_name: String,
    /// Engine storage type (`text`, `string`, `date`, `long`, ...).
    pub field_type: String,
    /// Whether the engine indexes the field.
    pub indexed: bool,
    /// Whether the engine stores the field.
    pub stored: bool,
    /// Whether the field holds multiple values.
    pub multi_valued: bool,
}

/// Entities of one type, prepared for indexing.
///
/// Preparation failures are kept alongside the successes; the backend logs
/// and drops them when the batch is written.
#[derive(Debug, Clone, Default)]
pub struct IndexBatch {
    /// Prepared documents, or the reason each entity could not be prepared.
    pub entries: Vec<(EntityRef, Result<FieldMap, PrepareError>)>,
    /// Index-time boosts per physical field.
    pub boosts: BTreeMap<String, f32>,
}

impl IndexBatch {
    /// Prepares every entity through its index.
    pub fn prepare<I: EntityIndex>(index: &I, entities: &[I::Entity]) -> Self {
        let entries = entities
            .iter()
            .map(|entity| (index.entity_ref(entity), index.prepare(entity)))
            .collect();
        Self {
            entries,
            boosts: index.field_boosts(),
        }
    }

    /// Number of entities in the batch, prepared or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch holds no entity.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Operations a search backend exposes to callers.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &'static str;

    /// Writes a batch of prepared entities. Entities that failed preparation
    /// are dropped; transport failures are logged, not returned.
    async fn update(&self, batch: IndexBatch, commit: Option<bool>) -> SearchResult<()>;

    /// Removes one entity from the index.
    async fn remove(&self, entity: &EntityRef, commit: Option<bool>) -> SearchResult<()>;

    /// Removes every document of the given types, or everything when empty,
    /// then optimizes the index.
    async fn clear(&self, entity_types: &[EntityType], commit: Option<bool>) -> SearchResult<()>;

    /// Runs a search.
    async fn search(&self, state: &QueryState) -> SearchResult<SearchResults<SearchHit>>;

    /// Finds documents similar to `entity`, or to the state's
    /// more-like-this target when `entity` is `None`. The state's query and
    /// filters, when present, narrow the candidates.
    async fn more_like_this(
        &self,
        entity: Option<&EntityRef>,
        state: &QueryState,
    ) -> SearchResult<SearchResults<SearchHit>>;

    /// Maps field schemas to engine field declarations, returning the
    /// content field name alongside.
    fn build_schema(&self, fields: &[FieldSchema]) -> (String, Vec<SchemaField>);
}

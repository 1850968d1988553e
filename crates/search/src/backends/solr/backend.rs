//! Solr backend implementation.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use clap::Parser;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::{
    DeleteTarget, IndexBatch, RawResponse, SchemaField, SearchBackend, SolrParams, SolrTransport,
};
#[cfg(feature = "http")]
use crate::error::ConfigError;
use crate::error::{QueryError, SearchResult};
use crate::schema::{EntityIndex, FieldSchema, SchemaRegistry};
use crate::types::{
    EntityRef, EntityType, FieldValue, ID_FIELD, PK_FIELD, QueryState, ResultRecord, SearchHit,
    SearchResults, TYPE_FIELD,
};

use super::schema::build_schema;
use super::search::facet_labels::rewrite_facet_labels;
use super::search::params::registered_types_clause;
use super::search::query_builder::build_query;
use super::search::{RequestAssembler, ResultNormalizer, SearchSettings};

#[cfg(feature = "http")]
use super::client::HttpSolrClient;

/// Field list requested for more-like-this queries.
pub const MLT_FIELD_LIST: &str = "*,score";

/// Similarity field used when no content field is registered.
pub const DEFAULT_CONTENT_FIELD: &str = "text";

/// Configuration for the Solr backend.
///
/// Can be built from environment variables with [`SolrConfig::from_env`],
/// deserialized, or constructed programmatically.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "quarry-search")]
#[command(about = "Solr search backend")]
pub struct SolrConfig {
    /// URL of the core that receives writes.
    #[arg(
        long,
        env = "QUARRY_SOLR_PRIMARY_URL",
        default_value = "http://localhost:8983/solr/default"
    )]
    #[serde(default = "default_primary_url")]
    pub primary_url: String,

    /// URL of the core that serves searches (default: the primary).
    #[arg(long, env = "QUARRY_SOLR_REPLICA_URL")]
    #[serde(default)]
    pub replica_url: Option<String>,

    /// Connection timeout in seconds.
    #[arg(long, env = "QUARRY_SOLR_TIMEOUT", default_value = "10")]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Request spelling suggestions with every search.
    #[arg(long, env = "QUARRY_INCLUDE_SPELLING", default_value = "false")]
    #[serde(default)]
    pub include_spelling: bool,

    /// Restrict results to registered entity types by default.
    #[arg(long, env = "QUARRY_LIMIT_TO_REGISTERED_TYPES", default_value = "true")]
    #[serde(default = "default_true")]
    pub limit_to_registered_types: bool,

    /// Commit after every write.
    #[arg(long, env = "QUARRY_SOLR_COMMIT", default_value = "true")]
    #[serde(default = "default_true")]
    pub commit: bool,
}

fn default_primary_url() -> String {
    "http://localhost:8983/solr/default".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            replica_url: None,
            timeout_secs: default_timeout_secs(),
            include_spelling: false,
            limit_to_registered_types: true,
            commit: true,
        }
    }
}

impl SolrConfig {
    /// Reads the configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["quarry-search"]).unwrap_or_default()
    }

    /// URL of the core that serves searches.
    pub fn replica_url(&self) -> &str {
        self.replica_url.as_deref().unwrap_or(&self.primary_url)
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The process-wide search settings.
    pub fn settings(&self) -> SearchSettings {
        SearchSettings {
            include_spelling: self.include_spelling,
            limit_to_registered_types: self.limit_to_registered_types,
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = url::Url::parse(&self.primary_url) {
            errors.push(format!("Invalid primary URL '{}': {}", self.primary_url, e));
        }
        if let Some(replica) = &self.replica_url {
            if let Err(e) = url::Url::parse(replica) {
                errors.push(format!("Invalid replica URL '{}': {}", replica, e));
            }
        }
        if self.timeout_secs == 0 {
            errors.push("Timeout cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Solr backend.
///
/// Writes go to the primary transport, reads to the replica. Both are
/// shared by concurrent callers; the registry is read under a short lock
/// that is never held across a transport call.
pub struct SolrBackend<T: SolrTransport> {
    primary: Arc<T>,
    replica: Arc<T>,
    config: SolrConfig,
    registry: Arc<RwLock<SchemaRegistry>>,
}

impl<T: SolrTransport> Debug for SolrBackend<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolrBackend")
            .field("config", &self.config)
            .field("registry_len", &self.registry.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "http")]
impl SolrBackend<HttpSolrClient> {
    /// Creates a backend talking HTTP to the configured cores, with an empty
    /// registry.
    pub fn new(config: SolrConfig) -> SearchResult<Self> {
        Self::with_shared_registry(config, Arc::new(RwLock::new(SchemaRegistry::new())))
    }

    /// Creates a backend sharing an existing registry.
    pub fn with_shared_registry(
        config: SolrConfig,
        registry: Arc<RwLock<SchemaRegistry>>,
    ) -> SearchResult<Self> {
        if config.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout.into());
        }
        let primary = HttpSolrClient::new(&config.primary_url, config.timeout())?;
        let replica = HttpSolrClient::new(config.replica_url(), config.timeout())?;

        tracing::info!(
            primary = %config.primary_url,
            replica = %config.replica_url(),
            timeout_secs = config.timeout_secs,
            "Solr backend initialized"
        );

        Ok(Self::with_transports(config, primary, replica, registry))
    }
}

impl<T: SolrTransport + 'static> SolrBackend<T> {
    /// Creates a backend over explicit transports.
    pub fn with_transports(
        config: SolrConfig,
        primary: T,
        replica: T,
        registry: Arc<RwLock<SchemaRegistry>>,
    ) -> Self {
        Self {
            primary: Arc::new(primary),
            replica: Arc::new(replica),
            config,
            registry,
        }
    }

    /// Creates a backend that reads and writes through one shared transport.
    pub fn with_shared_transport(
        config: SolrConfig,
        transport: Arc<T>,
        registry: Arc<RwLock<SchemaRegistry>>,
    ) -> Self {
        Self {
            primary: Arc::clone(&transport),
            replica: transport,
            config,
            registry,
        }
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &SolrConfig {
        &self.config
    }

    /// Returns the schema registry.
    pub fn registry(&self) -> &Arc<RwLock<SchemaRegistry>> {
        &self.registry
    }

    /// Prepares and writes entities of one type.
    pub async fn update_entities<I: EntityIndex>(
        &self,
        index: &I,
        entities: &[I::Entity],
        commit: Option<bool>,
    ) -> SearchResult<()> {
        self.update(IndexBatch::prepare(index, entities), commit)
            .await
    }

    /// Runs a search, building caller-defined result records.
    pub async fn search_as<R: ResultRecord>(
        &self,
        state: &QueryState,
    ) -> SearchResult<SearchResults<R>> {
        let settings = self.config.settings();
        let request = {
            let registry = self.registry.read();
            RequestAssembler::new(&registry, settings).assemble(state)?
        };
        let Some(request) = request else {
            return Ok(SearchResults::empty());
        };

        let started = Instant::now();
        let raw = match self.replica.search(&request.query, &request.params).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(query = %request.query, error = %e, "Failed to query Solr");
                RawResponse::empty()
            }
        };

        let results = self.normalize::<R>(raw, state.highlight)?;
        tracing::debug!(
            query = %request.query,
            hits = results.hits,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Solr search completed"
        );
        Ok(results)
    }

    /// Finds documents similar to `entity`, or to the state's
    /// more-like-this target when no entity is given, building
    /// caller-defined result records.
    pub async fn more_like_this_as<R: ResultRecord>(
        &self,
        entity: Option<&EntityRef>,
        state: &QueryState,
    ) -> SearchResult<SearchResults<R>> {
        let entity = entity
            .or(state.more_like_this.as_ref())
            .ok_or(QueryError::MissingSimilarityTarget)?;
        state.validate()?;

        let (similarity_field, params) = {
            let registry = self.registry.read();
            let similarity_field = registry
                .get(&entity.entity_type)
                .and_then(|schema| schema.content_field())
                .map(|field| field.index_name.clone())
                .or_else(|| registry.content_field_name().map(str::to_string))
                .unwrap_or_else(|| DEFAULT_CONTENT_FIELD.to_string());

            let mut params = SolrParams::new();
            params.set("fl", MLT_FIELD_LIST);
            params.set("start", state.start_offset.to_string());
            if let Some(rows) = state.rows() {
                params.set("rows", rows.to_string());
            }

            let limit = RequestAssembler::new(&registry, self.config.settings())
                .limits_to_registered_types(state);
            if limit {
                if let Some(clause) = registered_types_clause(&registry) {
                    params.push("fq", clause);
                }
            }

            let additional = build_query(state, &registry)?;
            if !additional.is_empty() && additional != "*:*" {
                params.push("fq", additional);
            }
            (similarity_field, params)
        };

        let query = format!("{}:{}", ID_FIELD, entity.identifier());
        let raw = match self
            .replica
            .more_like_this(&query, &similarity_field, &params)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(
                    document = %entity.identifier(),
                    error = %e,
                    "Failed to fetch More Like This from Solr"
                );
                RawResponse::empty()
            }
        };

        self.normalize::<R>(raw, false)
    }

    fn normalize<R: ResultRecord>(
        &self,
        raw: RawResponse,
        highlight: bool,
    ) -> SearchResult<SearchResults<R>> {
        let registry = self.registry.read();
        let mut results = ResultNormalizer::new(&registry, self.config.include_spelling)
            .normalize::<R>(raw, highlight)?;
        results.facets = rewrite_facet_labels(&registry, results.facets);
        Ok(results)
    }
}

fn clear_query(entity_types: &[EntityType]) -> String {
    if entity_types.is_empty() {
        return "*:*".to_string();
    }
    entity_types
        .iter()
        .map(|t| format!("{}:{}", TYPE_FIELD, t))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[async_trait]
impl<T: SolrTransport + 'static> SearchBackend for SolrBackend<T> {
    fn name(&self) -> &'static str {
        "solr"
    }

    async fn update(&self, batch: IndexBatch, commit: Option<bool>) -> SearchResult<()> {
        let commit = commit.unwrap_or(self.config.commit);
        let mut documents = Vec::with_capacity(batch.len());

        for (entity, prepared) in batch.entries {
            match prepared {
                Ok(mut fields) => {
                    fields.insert(ID_FIELD.to_string(), FieldValue::text(entity.identifier()));
                    fields.insert(
                        TYPE_FIELD.to_string(),
                        FieldValue::text(entity.entity_type.to_string()),
                    );
                    fields.insert(PK_FIELD.to_string(), FieldValue::text(entity.primary_key));
                    documents.push(fields);
                }
                Err(e) => {
                    tracing::warn!(
                        document = %entity.identifier(),
                        error = %e,
                        "Dropping entity that could not be prepared for indexing"
                    );
                }
            }
        }

        if documents.is_empty() {
            return Ok(());
        }

        let count = documents.len();
        if let Err(e) = self.primary.add(documents, commit, &batch.boosts).await {
            tracing::error!(documents = count, error = %e, "Failed to add documents to Solr");
        }
        Ok(())
    }

    async fn remove(&self, entity: &EntityRef, commit: Option<bool>) -> SearchResult<()> {
        let commit = commit.unwrap_or(self.config.commit);
        let identifier = entity.identifier();
        if let Err(e) = self
            .primary
            .delete(DeleteTarget::Id(identifier.clone()), commit)
            .await
        {
            tracing::error!(
                document = %identifier,
                error = %e,
                "Failed to remove document from Solr"
            );
        }
        Ok(())
    }

    async fn clear(&self, entity_types: &[EntityType], commit: Option<bool>) -> SearchResult<()> {
        let commit = commit.unwrap_or(self.config.commit);
        let query = clear_query(entity_types);

        let result = match self
            .primary
            .delete(DeleteTarget::Query(query.clone()), commit)
            .await
        {
            Ok(()) => self.primary.optimize().await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::error!(query = %query, error = %e, "Failed to clear Solr index");
        }
        Ok(())
    }

    async fn search(&self, state: &QueryState) -> SearchResult<SearchResults<SearchHit>> {
        self.search_as::<SearchHit>(state).await
    }

    async fn more_like_this(
        &self,
        entity: Option<&EntityRef>,
        state: &QueryState,
    ) -> SearchResult<SearchResults<SearchHit>> {
        self.more_like_this_as::<SearchHit>(entity, state).await
    }

    fn build_schema(&self, fields: &[FieldSchema]) -> (String, Vec<SchemaField>) {
        build_schema(fields)
    }
}

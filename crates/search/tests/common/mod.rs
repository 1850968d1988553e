//! Shared test infrastructure for the search crate.
//!
//! Provides a recording [`MockTransport`] and blog fixtures: a registered
//! `blog.post` schema, an [`EntityIndex`] for posts and canned Solr
//! responses.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{Value, json};

use quarry_search::backends::solr::{SolrBackend, SolrConfig};
use quarry_search::core::{DeleteTarget, RawResponse, SolrParams, SolrTransport};
use quarry_search::error::{PrepareError, TransportError};
use quarry_search::schema::{EntityIndex, EntitySchema, FieldSchema, FieldType, SchemaRegistry};
use quarry_search::types::{EntityType, FieldMap, FieldValue};

/// A transport call as the mock saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Add {
        documents: Vec<FieldMap>,
        commit: bool,
        boosts: BTreeMap<String, f32>,
    },
    Delete {
        target: DeleteTarget,
        commit: bool,
    },
    Optimize,
    Search {
        query: String,
        params: SolrParams,
    },
    MoreLikeThis {
        query: String,
        similarity_field: String,
        params: SolrParams,
    },
}

/// Records every call and answers reads with a canned response.
#[derive(Debug, Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    response: Mutex<RawResponse>,
    failure: Mutex<Option<TransportError>>,
}

impl MockTransport {
    /// A transport answering reads with an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport answering reads with `response`.
    pub fn with_response(response: RawResponse) -> Self {
        let transport = Self::default();
        *transport.response.lock() = response;
        transport
    }

    /// A transport failing every call with a network error.
    pub fn failing() -> Self {
        let transport = Self::default();
        *transport.failure.lock() = Some(TransportError::Network {
            message: "connection refused".to_string(),
        });
        transport
    }

    /// Snapshot of recorded calls.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call) -> Result<(), TransportError> {
        self.calls.lock().push(call);
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SolrTransport for MockTransport {
    async fn add(
        &self,
        documents: Vec<FieldMap>,
        commit: bool,
        boosts: &BTreeMap<String, f32>,
    ) -> Result<(), TransportError> {
        self.record(Call::Add {
            documents,
            commit,
            boosts: boosts.clone(),
        })
    }

    async fn delete(&self, target: DeleteTarget, commit: bool) -> Result<(), TransportError> {
        self.record(Call::Delete { target, commit })
    }

    async fn optimize(&self) -> Result<(), TransportError> {
        self.record(Call::Optimize)
    }

    async fn search(
        &self,
        query: &str,
        params: &SolrParams,
    ) -> Result<RawResponse, TransportError> {
        self.record(Call::Search {
            query: query.to_string(),
            params: params.clone(),
        })?;
        Ok(self.response.lock().clone())
    }

    async fn more_like_this(
        &self,
        query: &str,
        similarity_field: &str,
        params: &SolrParams,
    ) -> Result<RawResponse, TransportError> {
        self.record(Call::MoreLikeThis {
            query: query.to_string(),
            similarity_field: similarity_field.to_string(),
            params: params.clone(),
        })?;
        Ok(self.response.lock().clone())
    }
}

/// The `blog.post` entity type.
pub fn post_type() -> EntityType {
    EntityType::new("blog", "post")
}

/// Schema for blog posts.
///
/// `author` and `title` have facet twins; `pub_date` and `views` are
/// stored under suffixed index names.
pub fn post_schema() -> EntitySchema {
    EntitySchema::new(post_type())
        .with_field(FieldSchema::new("text", FieldType::Text).document())
        .with_field(FieldSchema::new("title", FieldType::Text))
        .with_field(FieldSchema::facet("title_exact", "title", FieldType::Text))
        .with_field(FieldSchema::new("author", FieldType::Text))
        .with_field(FieldSchema::facet("author_exact", "author", FieldType::Text))
        .with_field(FieldSchema::new("pub_date", FieldType::DateTime).with_index_name("pub_date_dt"))
        .with_field(FieldSchema::new("views", FieldType::Integer).with_index_name("views_i"))
}

/// A registry with the blog post schema registered.
pub fn blog_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register(post_schema());
    registry
}

/// A blog post as the application stores it.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: u32,
    pub title: String,
    pub author: String,
    pub body: String,
}

impl Post {
    pub fn new(id: u32, title: &str, author: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            author: author.to_string(),
            body: format!("{} by {}", title, author),
        }
    }
}

/// Indexes posts. Posts without a title cannot be prepared.
#[derive(Debug, Default)]
pub struct PostIndex {
    pub boosts: BTreeMap<String, f32>,
}

impl EntityIndex for PostIndex {
    type Entity = Post;

    fn entity_type(&self) -> EntityType {
        post_type()
    }

    fn primary_key(&self, post: &Post) -> String {
        post.id.to_string()
    }

    fn prepare(&self, post: &Post) -> Result<FieldMap, PrepareError> {
        if post.title.is_empty() {
            return Err(PrepareError::new(
                format!("blog.post.{}", post.id),
                "post has no title",
            ));
        }
        let mut fields = FieldMap::new();
        fields.insert("text".to_string(), FieldValue::text(&post.body));
        fields.insert("title".to_string(), FieldValue::text(&post.title));
        fields.insert("author".to_string(), FieldValue::text(&post.author));
        fields.insert("author_exact".to_string(), FieldValue::text(&post.author));
        Ok(fields)
    }

    fn field_boosts(&self) -> BTreeMap<String, f32> {
        self.boosts.clone()
    }
}

/// A backend over `transport` with the blog registry.
pub fn backend_with(transport: Arc<MockTransport>) -> SolrBackend<MockTransport> {
    backend_with_config(transport, SolrConfig::default())
}

/// A backend over `transport` with the blog registry and `config`.
pub fn backend_with_config(
    transport: Arc<MockTransport>,
    config: SolrConfig,
) -> SolrBackend<MockTransport> {
    SolrBackend::with_shared_transport(config, transport, Arc::new(RwLock::new(blog_registry())))
}

/// A stored post document as Solr returns it.
pub fn post_doc(pk: u32, title: &str) -> Value {
    json!({
        "id": format!("blog.post.{}", pk),
        "entity_type": "blog.post",
        "entity_id": pk.to_string(),
        "title": title,
        "views_i": 10 + pk,
        "pub_date_dt": "2009-07-23T00:00:00Z",
        "score": 1.5
    })
}

/// A stored document of an unregistered type.
pub fn foreign_doc(pk: u32) -> Value {
    json!({
        "id": format!("shop.product.{}", pk),
        "entity_type": "shop.product",
        "entity_id": pk.to_string(),
        "score": 0.5
    })
}

/// Parses a Solr JSON response.
pub fn raw_response(body: Value) -> RawResponse {
    serde_json::from_value(body).expect("valid Solr response")
}

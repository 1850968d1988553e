//! HTTP transport for Solr.
//!
//! Talks to one Solr core over its JSON update handler and its select and
//! more-like-this request handlers.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Map, Value, json};

use crate::core::{DeleteTarget, RawResponse, SolrParams, SolrTransport};
use crate::error::{ConfigError, TransportError};
use crate::types::FieldMap;

use super::search::encoder::to_json;

/// A Solr core reachable over HTTP.
#[derive(Clone)]
pub struct HttpSolrClient {
    client: Client,
    base_url: String,
}

impl Debug for HttpSolrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSolrClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpSolrClient {
    /// Creates a client for the core at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        url::Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The core's base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, handler: &str) -> String {
        format!("{}/{}", self.base_url, handler)
    }

    async fn post_update(&self, body: String, commit: bool) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint("update/json"))
            .query(&[("commit", commit.to_string()), ("wt", "json".to_string())])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(network_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn select(
        &self,
        handler: &str,
        pairs: Vec<(&str, &str)>,
    ) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint(handler))
            .form(&pairs)
            .send()
            .await
            .map_err(network_error)?;
        let response = check_status(response).await?;
        let status = response.status().as_u16();
        response
            .json::<RawResponse>()
            .await
            .map_err(|e| TransportError::EngineQuery {
                status,
                message: format!("unreadable response body: {}", e),
            })
    }
}

fn network_error(err: reqwest::Error) -> TransportError {
    TransportError::Network {
        message: err.to_string(),
    }
}

/// Turns non-2xx responses into engine errors, using Solr's `error.msg`
/// when the body carries one.
async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("msg"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);
    Err(TransportError::EngineQuery {
        status: status.as_u16(),
        message,
    })
}

fn document_json(document: &FieldMap, boosts: &BTreeMap<String, f32>) -> Value {
    let fields: Map<String, Value> = document
        .iter()
        .map(|(name, value)| {
            let value = to_json(value);
            let value = match boosts.get(name) {
                Some(boost) => json!({ "value": value, "boost": boost }),
                None => value,
            };
            (name.clone(), value)
        })
        .collect();
    Value::Object(fields)
}

/// Serializes an update body.
///
/// Without boosts this is a plain array of documents. With boosts every
/// document becomes its own `"add"` command; Solr accepts the repeated key.
pub fn update_body(
    documents: &[FieldMap],
    boosts: &BTreeMap<String, f32>,
) -> Result<String, TransportError> {
    let serialize = |value: &Value| {
        serde_json::to_string(value).map_err(|e| TransportError::Serialization {
            message: e.to_string(),
        })
    };

    if boosts.is_empty() {
        let docs: Vec<Value> = documents.iter().map(|d| document_json(d, boosts)).collect();
        return serialize(&Value::Array(docs));
    }

    let commands = documents
        .iter()
        .map(|d| serialize(&json!({ "doc": document_json(d, boosts) })).map(|c| format!("\"add\":{}", c)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{{{}}}", commands.join(",")))
}

#[async_trait]
impl SolrTransport for HttpSolrClient {
    async fn add(
        &self,
        documents: Vec<FieldMap>,
        commit: bool,
        boosts: &BTreeMap<String, f32>,
    ) -> Result<(), TransportError> {
        let body = update_body(&documents, boosts)?;
        self.post_update(body, commit).await
    }

    async fn delete(&self, target: DeleteTarget, commit: bool) -> Result<(), TransportError> {
        let command = match target {
            DeleteTarget::Id(id) => json!({ "delete": { "id": id } }),
            DeleteTarget::Query(query) => json!({ "delete": { "query": query } }),
        };
        self.post_update(command.to_string(), commit).await
    }

    async fn optimize(&self) -> Result<(), TransportError> {
        self.post_update(json!({ "optimize": {} }).to_string(), false)
            .await
    }

    async fn search(
        &self,
        query: &str,
        params: &SolrParams,
    ) -> Result<RawResponse, TransportError> {
        let mut pairs = vec![("q", query), ("wt", "json")];
        pairs.extend(params.iter());
        self.select("select", pairs).await
    }

    async fn more_like_this(
        &self,
        query: &str,
        similarity_field: &str,
        params: &SolrParams,
    ) -> Result<RawResponse, TransportError> {
        let mut pairs = vec![("q", query), ("mlt.fl", similarity_field), ("wt", "json")];
        pairs.extend(params.iter());
        self.select("mlt", pairs).await
    }
}

//! Error types for the search layer.
//!
//! Errors are grouped by the stage that produces them: query compilation,
//! transport, response decoding and configuration. Transport errors are
//! normally absorbed by the backend façade; the others reach the caller.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Query building errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Errors talking to the search engine
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Errors converting engine values back into typed values
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while turning a [`QueryState`](crate::types::QueryState) into a request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The filter operator is not one the compiler knows.
    #[error("unsupported filter operator: {operator}")]
    UnsupportedOperator { operator: String },

    /// The value does not fit the operator (e.g. `range` without two bounds).
    #[error("invalid value for {field}__{operator}: {message}")]
    InvalidFilterValue {
        field: String,
        operator: String,
        message: String,
    },

    /// End offset lies before the start offset.
    #[error("invalid pagination: end offset {end} is before start offset {start}")]
    InvalidPagination { start: usize, end: usize },

    /// More-like-this was requested without a source entity.
    #[error("no entity was provided to determine more-like-this results")]
    MissingSimilarityTarget,

    /// The entity type has no registered schema.
    #[error("entity type is not registered: {entity_type}")]
    UnknownEntityType { entity_type: String },
}

/// Errors from the transport layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The engine could not be reached.
    #[error("network failure talking to search engine: {message}")]
    Network { message: String },

    /// The engine rejected the request.
    #[error("search engine rejected request (status {status}): {message}")]
    EngineQuery { status: u16, message: String },

    /// The request body could not be serialized.
    #[error("failed to serialize request: {message}")]
    Serialization { message: String },
}

/// Errors converting raw engine payloads into typed values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// A field value does not match its declared type.
    #[error("cannot decode field '{field}' as {expected}: {value}")]
    InvalidValue {
        field: String,
        expected: String,
        value: String,
    },

    /// The response does not have the expected structure.
    #[error("malformed search response: {message}")]
    MalformedResponse { message: String },
}

/// Failure to prepare a single entity for indexing.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to prepare {identifier} for indexing: {message}")]
pub struct PrepareError {
    pub identifier: String,
    pub message: String,
}

impl PrepareError {
    /// Creates a preparation error for the given document identifier.
    pub fn new(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            message: message.into(),
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// An endpoint URL does not parse.
    #[error("invalid search engine URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Timeout must be positive.
    #[error("connection timeout must be greater than zero")]
    InvalidTimeout,

    /// No connection is registered under the alias.
    #[error("no search connection registered under alias '{alias}'")]
    UnknownAlias { alias: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    ClientBuild { message: String },
}

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::MalformedResponse {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Decode(err.into())
    }
}

impl SearchError {
    /// Returns true if this error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, SearchError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_operator_display() {
        let err = QueryError::UnsupportedOperator {
            operator: "near".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported filter operator: near");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::EngineQuery {
            status: 400,
            message: "undefined field foo".to_string(),
        };
        assert!(err.to_string().contains("status 400"));
        assert!(err.to_string().contains("undefined field foo"));
    }

    #[test]
    fn test_search_error_from_sub_errors() {
        let err: SearchError = QueryError::MissingSimilarityTarget.into();
        assert!(matches!(err, SearchError::Query(_)));
        assert!(!err.is_transport());

        let err: SearchError = TransportError::Network {
            message: "connection refused".to_string(),
        }
        .into();
        assert!(err.is_transport());
    }

    #[test]
    fn test_decode_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: SearchError = serde_err.into();
        assert!(matches!(
            err,
            SearchError::Decode(DecodeError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_prepare_error_display() {
        let err = PrepareError::new("blog.post.7", "invalid utf-8 in body");
        assert_eq!(
            err.to_string(),
            "failed to prepare blog.post.7 for indexing: invalid utf-8 in body"
        );
    }
}

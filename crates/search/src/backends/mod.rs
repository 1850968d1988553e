//! Search engine backend implementations.
//!
//! # Available Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Solr | `http` for the HTTP transport | Apache Solr over its JSON API |
//!
//! The Solr backend itself is always compiled; only [`solr::HttpSolrClient`]
//! needs the `http` feature. Other transports can implement
//! [`SolrTransport`](crate::core::SolrTransport).

pub mod solr;

//! Connection aliases and read/write routing.
//!
//! A [`ConnectionHandler`] holds the configured backends by alias. A
//! [`ConnectionRouter`] decides which alias serves reads and writes for an
//! entity type by asking its [`Router`]s in order; the first answer wins and
//! [`DEFAULT_ALIAS`] is used when none answers.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::core::SearchBackend;
use crate::error::ConfigError;
use crate::types::EntityType;

/// Alias that must always be configured.
pub const DEFAULT_ALIAS: &str = "default";

/// Backends registered by alias.
#[derive(Clone)]
pub struct ConnectionHandler {
    connections: HashMap<String, Arc<dyn SearchBackend>>,
}

impl Debug for ConnectionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("aliases", &self.aliases())
            .finish()
    }
}

impl ConnectionHandler {
    /// Creates a handler with `backend` under the default alias.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        let mut connections = HashMap::new();
        connections.insert(DEFAULT_ALIAS.to_string(), backend);
        Self { connections }
    }

    /// Creates a handler from a prepared alias map, which must contain the
    /// default alias.
    pub fn from_connections(
        connections: HashMap<String, Arc<dyn SearchBackend>>,
    ) -> Result<Self, ConfigError> {
        if !connections.contains_key(DEFAULT_ALIAS) {
            return Err(ConfigError::UnknownAlias {
                alias: DEFAULT_ALIAS.to_string(),
            });
        }
        Ok(Self { connections })
    }

    /// Registers a backend, returning the one previously under `alias`.
    pub fn insert(
        &mut self,
        alias: impl Into<String>,
        backend: Arc<dyn SearchBackend>,
    ) -> Option<Arc<dyn SearchBackend>> {
        self.connections.insert(alias.into(), backend)
    }

    /// Looks up the backend under `alias`.
    pub fn get(&self, alias: &str) -> Result<Arc<dyn SearchBackend>, ConfigError> {
        self.connections
            .get(alias)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownAlias {
                alias: alias.to_string(),
            })
    }

    /// Configured aliases, sorted.
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }
}

/// Chooses a connection alias per entity type.
///
/// Returning `None` defers to the next router.
pub trait Router: Send + Sync {
    /// Alias to read `entity_type` from.
    fn for_read(&self, _entity_type: &EntityType) -> Option<String> {
        None
    }

    /// Alias to write `entity_type` to.
    fn for_write(&self, _entity_type: &EntityType) -> Option<String> {
        None
    }
}

/// Sends everything to the default alias.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRouter;

impl Router for DefaultRouter {
    fn for_read(&self, _entity_type: &EntityType) -> Option<String> {
        Some(DEFAULT_ALIAS.to_string())
    }

    fn for_write(&self, _entity_type: &EntityType) -> Option<String> {
        Some(DEFAULT_ALIAS.to_string())
    }
}

/// Consults routers in order.
#[derive(Default)]
pub struct ConnectionRouter {
    routers: Vec<Box<dyn Router>>,
}

impl Debug for ConnectionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRouter")
            .field("routers", &self.routers.len())
            .finish()
    }
}

impl ConnectionRouter {
    /// Creates a router chain.
    pub fn new(routers: Vec<Box<dyn Router>>) -> Self {
        Self { routers }
    }

    /// Appends a router to the chain.
    pub fn push(&mut self, router: impl Router + 'static) {
        self.routers.push(Box::new(router));
    }

    /// Alias to read `entity_type` from.
    pub fn for_read(&self, entity_type: &EntityType) -> String {
        self.routers
            .iter()
            .find_map(|r| r.for_read(entity_type))
            .unwrap_or_else(|| DEFAULT_ALIAS.to_string())
    }

    /// Alias to write `entity_type` to.
    pub fn for_write(&self, entity_type: &EntityType) -> String {
        self.routers
            .iter()
            .find_map(|r| r.for_write(entity_type))
            .unwrap_or_else(|| DEFAULT_ALIAS.to_string())
    }

    /// Backend that serves reads of `entity_type`.
    pub fn read_backend(
        &self,
        handler: &ConnectionHandler,
        entity_type: &EntityType,
    ) -> Result<Arc<dyn SearchBackend>, ConfigError> {
        handler.get(&self.for_read(entity_type))
    }

    /// Backend that receives writes of `entity_type`.
    pub fn write_backend(
        &self,
        handler: &ConnectionHandler,
        entity_type: &EntityType,
    ) -> Result<Arc<dyn SearchBackend>, ConfigError> {
        handler.get(&self.for_write(entity_type))
    }
}

//! Connection registry
//!
//! Resolves configured connection names to cached [`Connection`] facades.

use crate::adapter::Adapter;
use crate::config::{AdapterKind, ConnectionConfig, RegistryConfig};
use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::events::{EventSink, TracingSink};
use crate::native::{Connector, MemoryConnector, RedisConnector};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Connector used for each adapter kind
pub struct AdapterResolver {
    connectors: HashMap<AdapterKind, Arc<dyn Connector>>,
}

impl AdapterResolver {
    /// Redis through the `redis` crate, memory through one shared store
    pub fn new() -> Self {
        let mut resolver = AdapterResolver {
            connectors: HashMap::new(),
        };
        resolver.register(AdapterKind::Redis, Arc::new(RedisConnector::new()));
        resolver.register(AdapterKind::Memory, Arc::new(MemoryConnector::new()));
        resolver
    }

    /// Replace the connector for `kind`
    pub fn with_connector(mut self, kind: AdapterKind, connector: Arc<dyn Connector>) -> Self {
        self.register(kind, connector);
        self
    }

    fn register(&mut self, kind: AdapterKind, connector: Arc<dyn Connector>) {
        self.connectors.insert(kind, connector);
    }

    /// Unconnected adapter for `config`
    pub fn resolve(&self, config: &ConnectionConfig) -> Result<Adapter> {
        let connector = self.connectors.get(&config.adapter).ok_or_else(|| {
            ClientError::configuration(format!("No connector for adapter {:?}", config.adapter))
        })?;
        Ok(Adapter::new(config.clone(), connector.clone()))
    }
}

impl Default for AdapterResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Named connections, created on first use
pub struct ConnectionRegistry {
    config: RegistryConfig,
    resolver: AdapterResolver,
    sink: Arc<dyn EventSink>,
    connections: HashMap<String, Connection>,
}

impl ConnectionRegistry {
    /// Registry reporting events through `tracing`
    pub fn new(config: RegistryConfig) -> Self {
        ConnectionRegistry {
            config,
            resolver: AdapterResolver::new(),
            sink: Arc::new(TracingSink),
            connections: HashMap::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: AdapterResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sink for connections created from now on
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The connection named `name`, created if needed
    ///
    /// Nothing is opened here; the connection connects on first use.
    pub fn connection(&mut self, name: &str) -> Result<&mut Connection> {
        if !self.connections.contains_key(name) {
            let config = self
                .config
                .get(name)
                .ok_or_else(|| ClientError::configuration(format!("Unknown connection '{}'", name)))?;
            let adapter = self.resolver.resolve(config)?;
            debug!("Created connection {} ({:?})", name, config.adapter);
            self.connections
                .insert(name.to_string(), Connection::new(name, adapter, self.sink.clone()));
        }
        self.connections
            .get_mut(name)
            .ok_or_else(|| ClientError::configuration(format!("Unknown connection '{}'", name)))
    }

    /// The configured default, or the only configured connection
    pub fn default_connection(&mut self) -> Result<&mut Connection> {
        let name = self.config.default_name()?.to_string();
        self.connection(&name)
    }

    /// Drop the cached connection `name`; fails if it was never created
    pub fn purge(&mut self, name: &str) -> Result<()> {
        match self.connections.remove(name) {
            Some(_) => {
                info!("Purged connection {}", name);
                Ok(())
            }
            None => Err(ClientError::configuration(format!(
                "Connection '{}' was never resolved",
                name
            ))),
        }
    }

    /// Drop every cached connection
    pub fn purge_all(&mut self) {
        let count = self.connections.len();
        self.connections.clear();
        info!("Purged {} connections", count);
    }

    /// Names of the connections created so far
    pub fn resolved(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }
}

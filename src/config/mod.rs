//! Connection configuration
//!
//! Immutable value objects describing how to reach one logical connection,
//! plus the registry-level mapping from connection names to configurations.

use crate::error::{ClientError, Result};
use serde::Deserialize;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port used when a host is configured without one
pub const DEFAULT_PORT: u16 = 6379;

/// Which connector builds the native handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// A Redis-protocol server reached through the `redis` crate
    Redis,
    /// The in-process store
    Memory,
}

impl Default for AdapterKind {
    fn default() -> Self {
        AdapterKind::Redis
    }
}

/// How values are encoded by the typed value helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationMode {
    /// Raw bytes only
    None,
    /// serde_json encoding
    Json,
}

impl Default for SerializationMode {
    fn default() -> Self {
        SerializationMode::None
    }
}

/// Where a single node lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

impl Endpoint {
    /// Parse a `host:port` node address; the port is optional
    pub fn parse(address: &str) -> Result<Self> {
        match address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port = port.parse::<u16>().map_err(|_| {
                    ClientError::configuration(format!("Invalid port in node address '{}'", address))
                })?;
                Ok(Endpoint::Tcp { host: host.to_string(), port })
            }
            _ if !address.is_empty() => Ok(Endpoint::Tcp {
                host: address.to_string(),
                port: DEFAULT_PORT,
            }),
            _ => Err(ClientError::configuration("Empty node address")),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Tcp { host, port } => write!(f, "{}:{}", host, port),
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Parameters of one logical connection
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connector used by the registry
    pub adapter: AdapterKind,

    /// TCP host (exclusive with `socket`)
    pub host: Option<String>,

    /// TCP port, defaults to 6379
    pub port: Option<u16>,

    /// Unix socket path (exclusive with `host`)
    pub socket: Option<PathBuf>,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Park the handle on disconnect and reuse it on the next connect
    pub persistent: bool,

    /// Connect timeout in seconds, 0 for none
    pub connect_timeout: Option<f64>,

    /// Read timeout in seconds, 0 for none
    pub read_timeout: Option<f64>,

    /// Prepended to every key
    pub key_prefix: String,

    /// Database selected after connecting
    pub database: Option<i64>,

    pub serialization: SerializationMode,

    /// Additional `host:port` nodes of a cluster
    pub cluster_nodes: Vec<String>,

    /// Use the multi-node topology even when `cluster_nodes` is empty
    pub cluster: bool,

    /// Retry empty intermediate SCAN batches
    pub scan_retry: bool,

    /// Sent with CLIENT SETNAME once connected
    pub client_name: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            adapter: AdapterKind::default(),
            host: None,
            port: None,
            socket: None,
            username: None,
            password: None,
            persistent: false,
            connect_timeout: None,
            read_timeout: None,
            key_prefix: String::new(),
            database: None,
            serialization: SerializationMode::default(),
            cluster_nodes: Vec::new(),
            cluster: false,
            scan_retry: true,
            client_name: None,
        }
    }
}

impl ConnectionConfig {
    /// TCP connection to `host` on the default port
    pub fn tcp(host: impl Into<String>) -> Self {
        ConnectionConfig {
            host: Some(host.into()),
            ..Default::default()
        }
    }

    /// Unix socket connection
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        ConnectionConfig {
            socket: Some(path.into()),
            ..Default::default()
        }
    }

    /// In-process store named `node`
    pub fn memory(node: impl Into<String>) -> Self {
        ConnectionConfig {
            adapter: AdapterKind::Memory,
            host: Some(node.into()),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_credentials(mut self, username: Option<String>, password: impl Into<String>) -> Self {
        self.username = username;
        self.password = Some(password.into());
        self
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_timeouts(mut self, connect: Option<f64>, read: Option<f64>) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    pub fn with_serialization(mut self, mode: SerializationMode) -> Self {
        self.serialization = mode;
        self
    }

    pub fn with_cluster_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cluster = true;
        self.cluster_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn with_scan_retry(mut self, retry: bool) -> Self {
        self.scan_retry = retry;
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    /// Check the parameters before any I/O happens
    pub fn validate(&self) -> Result<()> {
        match (&self.host, &self.socket) {
            (Some(_), Some(_)) => {
                return Err(ClientError::configuration(
                    "Both host and socket are configured, exactly one must be set",
                ))
            }
            (None, None) => {
                return Err(ClientError::configuration(
                    "Neither host nor socket is configured, exactly one must be set",
                ))
            }
            (Some(host), None) if host.is_empty() => {
                return Err(ClientError::configuration("Host must not be empty"))
            }
            (None, Some(_)) if self.port.is_some() => {
                return Err(ClientError::configuration("A port cannot be combined with a socket"))
            }
            _ => {}
        }

        for (name, value) in [
            ("connect_timeout", self.connect_timeout),
            ("read_timeout", self.read_timeout),
        ] {
            if let Some(secs) = value {
                if Duration::try_from_secs_f64(secs).is_err() {
                    return Err(ClientError::configuration(format!(
                        "Invalid {}: {}",
                        name, secs
                    )));
                }
            }
        }

        if let Some(db) = self.database {
            if db < 0 {
                return Err(ClientError::configuration(format!("Invalid database index: {}", db)));
            }
        }

        if self.is_cluster() {
            if self.socket.is_some() {
                return Err(ClientError::configuration(
                    "Cluster connections must use host, not socket",
                ));
            }
            if self.database.unwrap_or(0) != 0 {
                return Err(ClientError::configuration(
                    "Cluster connections only support database 0",
                ));
            }
            for node in &self.cluster_nodes {
                Endpoint::parse(node)?;
            }
        }

        Ok(())
    }

    /// True when the multi-node topology is selected
    pub fn is_cluster(&self) -> bool {
        self.cluster || !self.cluster_nodes.is_empty()
    }

    /// The primary endpoint (host/port or socket)
    pub fn endpoint(&self) -> Result<Endpoint> {
        self.validate()?;
        match (&self.host, &self.socket) {
            (Some(host), None) => Ok(Endpoint::Tcp {
                host: host.clone(),
                port: self.port.unwrap_or(DEFAULT_PORT),
            }),
            (None, Some(socket)) => Ok(Endpoint::Unix(socket.clone())),
            _ => Err(ClientError::configuration("Exactly one of host or socket must be set")),
        }
    }

    /// Primary endpoint followed by the distinct cluster nodes
    pub fn nodes(&self) -> Result<Vec<Endpoint>> {
        let mut nodes = vec![self.endpoint()?];
        for address in &self.cluster_nodes {
            let node = Endpoint::parse(address)?;
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    /// Zero means no timeout
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout.and_then(timeout)
    }

    /// Zero means no timeout
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout.and_then(timeout)
    }

    /// Key identifying a persistent handle slot
    pub fn persistent_id(&self) -> String {
        let target = match (&self.host, &self.socket) {
            (Some(host), _) => format!("{}:{}", host, self.port.unwrap_or(DEFAULT_PORT)),
            (None, Some(socket)) => socket.display().to_string(),
            (None, None) => String::new(),
        };
        let password = self.password.as_deref().map(|password| {
            let mut hasher = SipHasher13::new();
            password.hash(&mut hasher);
            hasher.finish()
        });
        format!(
            "{:?}|{}|{}|{}|{:x}|{}",
            self.adapter,
            target,
            self.database.unwrap_or(0),
            self.username.as_deref().unwrap_or(""),
            password.unwrap_or(0),
            self.cluster_nodes.join(",")
        )
    }
}

/// A timeout in seconds; zero and unrepresentable values give none
fn timeout(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok().filter(|d| !d.is_zero())
}

/// Connection names mapped to their configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Name resolved by `default_connection()`
    pub default: Option<String>,

    pub connections: HashMap<String, ConnectionConfig>,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection(mut self, name: impl Into<String>, config: ConnectionConfig) -> Self {
        self.connections.insert(name.into(), config);
        self
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ClientError::configuration(format!("Invalid configuration: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClientError::configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn get(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.get(name)
    }

    /// Name of the default connection
    ///
    /// The explicit default wins; otherwise a lone configured connection is
    /// the default.
    pub fn default_name(&self) -> Result<&str> {
        if let Some(name) = &self.default {
            return Ok(name);
        }
        let mut names = self.connections.keys();
        match (names.next(), names.next()) {
            (Some(only), None) => Ok(only),
            (None, _) => Err(ClientError::configuration("No connection is configured")),
            _ => Err(ClientError::configuration(
                "No default connection is set and several connections are configured",
            )),
        }
    }
}

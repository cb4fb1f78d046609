//! Redis server handles
//!
//! Backed by the synchronous API of the `redis` crate: a plain `Connection`
//! for single nodes and a `ClusterConnection` as the routing handle of a
//! cluster.

use super::{Connector, NativeHandle};
use crate::config::{ConnectionConfig, Endpoint};
use crate::error::NativeError;
use crate::protocol::RespValue;
use bytes::Bytes;
use redis::cluster::{ClusterClient, ClusterConnection};
use redis::{ConnectionLike, RedisError};
use tracing::debug;

/// Opens handles to Redis-protocol servers
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

impl RedisConnector {
    pub fn new() -> Self {
        RedisConnector
    }
}

/// `redis://` or `redis+unix://` URL of an endpoint
fn connection_url(endpoint: &Endpoint) -> String {
    match endpoint {
        Endpoint::Tcp { host, port } if host.contains(':') => format!("redis://[{}]:{}/", host, port),
        Endpoint::Tcp { host, port } => format!("redis://{}:{}/", host, port),
        Endpoint::Unix(path) => format!("redis+unix://{}", path.display()),
    }
}

impl Connector for RedisConnector {
    fn open(
        &self,
        endpoint: &Endpoint,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn NativeHandle>, NativeError> {
        let url = connection_url(endpoint);
        debug!("Opening {}", url);

        let client = redis::Client::open(url.as_str())
            .map_err(|e| NativeError::with_cause(format!("Invalid address {}", endpoint), e.into()))?;

        let connection = match config.connect_timeout() {
            Some(timeout) => client.get_connection_with_timeout(timeout),
            None => client.get_connection(),
        }
        .map_err(|e| NativeError::with_cause(format!("Failed to connect to {}", endpoint), e.into()))?;

        connection.set_read_timeout(config.read_timeout())?;

        Ok(Box::new(RedisHandle::new(Link::Single(connection))))
    }

    fn open_cluster(
        &self,
        nodes: &[Endpoint],
        config: &ConnectionConfig,
    ) -> Result<Box<dyn NativeHandle>, NativeError> {
        let urls: Vec<String> = nodes.iter().map(connection_url).collect();
        debug!("Opening cluster over {} nodes", urls.len());

        let mut builder = ClusterClient::builder(urls);
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connection_timeout(timeout);
        }
        if let Some(timeout) = config.read_timeout() {
            builder = builder.response_timeout(timeout);
        }
        if let Some(username) = &config.username {
            builder = builder.username(username.clone());
        }
        if let Some(password) = &config.password {
            builder = builder.password(password.clone());
        }

        let client = builder.build()?;
        let connection = client
            .get_connection()
            .map_err(|e| NativeError::with_cause("Failed to connect to cluster", e.into()))?;

        Ok(Box::new(RedisHandle::new(Link::Cluster(connection))))
    }
}

enum Link {
    Single(redis::Connection),
    Cluster(ClusterConnection),
}

impl Link {
    fn request(&mut self, cmd: &redis::Cmd) -> redis::RedisResult<redis::Value> {
        match self {
            Link::Single(connection) => connection.req_command(cmd),
            Link::Cluster(connection) => connection.req_command(cmd),
        }
    }
}

/// A live connection through the `redis` crate
pub struct RedisHandle {
    link: Option<Link>,
    last_error: Option<String>,
}

impl RedisHandle {
    fn new(link: Link) -> Self {
        RedisHandle {
            link: Some(link),
            last_error: None,
        }
    }
}

/// Error replies carry a code (`ERR`, `WRONGTYPE`, `MOVED` ...), transport
/// failures do not.
fn is_error_reply(err: &RedisError) -> bool {
    err.code().is_some()
}

/// The error reply as the server sent it, e.g. `ERR no such key`
fn reply_message(err: &RedisError) -> String {
    match (err.code(), err.detail()) {
        (Some(code), Some(detail)) => format!("{} {}", code, detail),
        (Some(code), None) => code.to_string(),
        _ => err.to_string(),
    }
}

impl NativeHandle for RedisHandle {
    fn call(&mut self, name: &str, args: &[Bytes]) -> Result<RespValue, NativeError> {
        let link = self
            .link
            .as_mut()
            .ok_or_else(|| NativeError::new("Connection is closed"))?;

        let mut cmd = redis::cmd(name);
        for arg in args {
            cmd.arg(&arg[..]);
        }

        match link.request(&cmd) {
            Ok(value) => Ok(RespValue::from(value)),
            Err(err) if is_error_reply(&err) => {
                let message = reply_message(&err);
                self.last_error = Some(message.clone());
                Ok(RespValue::Error(message))
            }
            Err(err) => Err(NativeError::from(err)),
        }
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    fn close(&mut self) {
        self.link = None;
    }
}

//! Topology strategies
//!
//! A single-node adapter sends everything through one handle. A multi-node
//! adapter sends commands through the routing handle of the native cluster
//! client and keeps one extra handle per node for scan and fan-out.

use crate::config::{ConnectionConfig, Endpoint};
use crate::error::{translate, ErrorKind, NativeError, Result};
use crate::native::{Connector, NativeHandle};
use crate::protocol::RespValue;
use bytes::Bytes;
use tracing::debug;

/// How an adapter reaches its store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    Single,
    Cluster,
}

impl Topology {
    /// Strategy selected by the configuration
    pub fn for_config(config: &ConnectionConfig) -> Self {
        if config.is_cluster() {
            Topology::Cluster
        } else {
            Topology::Single
        }
    }

    /// Open and prepare every handle this topology needs
    ///
    /// Every failure is a connection error.
    pub(crate) fn open(&self, connector: &dyn Connector, config: &ConnectionConfig) -> Result<Handles> {
        match self {
            Topology::Single => {
                let endpoint = config.endpoint()?;
                let mut handle = open_node(connector, &endpoint, config)?;
                if let Some(db) = config.database {
                    handshake(handle.as_mut(), "SELECT", &[Bytes::from(db.to_string())])?;
                }
                Ok(Handles {
                    command: handle,
                    nodes: Vec::new(),
                })
            }
            Topology::Cluster => {
                let endpoints = config.nodes()?;
                let command = connector
                    .open_cluster(&endpoints, config)
                    .map_err(|e| translate(ErrorKind::Connection, e))?;
                let nodes = endpoints
                    .iter()
                    .map(|endpoint| open_node(connector, endpoint, config))
                    .collect::<Result<Vec<_>>>()?;
                debug!("Opened {} node handles", nodes.len());
                Ok(Handles { command, nodes })
            }
        }
    }
}

/// Open one node handle, authenticate it and name it
fn open_node(
    connector: &dyn Connector,
    endpoint: &Endpoint,
    config: &ConnectionConfig,
) -> Result<Box<dyn NativeHandle>> {
    let mut handle = connector
        .open(endpoint, config)
        .map_err(|e| translate(ErrorKind::Connection, e))?;

    if let Some(password) = &config.password {
        // A password alone goes out as the single-argument legacy AUTH
        let mut args = Vec::with_capacity(2);
        if let Some(username) = &config.username {
            args.push(Bytes::from(username.clone()));
        }
        args.push(Bytes::from(password.clone()));
        handshake(handle.as_mut(), "AUTH", &args)?;
    }

    if let Some(name) = &config.client_name {
        handshake(
            handle.as_mut(),
            "CLIENT",
            &[Bytes::from_static(b"SETNAME"), Bytes::from(name.clone())],
        )?;
    }

    Ok(handle)
}

/// Run one connection-setup command, any failure is a connection error
fn handshake(handle: &mut dyn NativeHandle, name: &str, args: &[Bytes]) -> Result<()> {
    let reply = handle
        .call(name, args)
        .map_err(|e| translate(ErrorKind::Connection, e))?;

    let failure = match (&reply, handle.last_error()) {
        (RespValue::Error(message), _) => Some(message.clone()),
        (_, Some(message)) => Some(message.to_string()),
        _ => None,
    };
    if let Some(message) = failure {
        handle.clear_last_error();
        return Err(translate(ErrorKind::Connection, NativeError::new(message)));
    }
    Ok(())
}

/// The live handles of a connected adapter
pub(crate) struct Handles {
    /// Carries every command
    pub command: Box<dyn NativeHandle>,
    /// One per node, multi-node topologies only
    pub nodes: Vec<Box<dyn NativeHandle>>,
}

impl Handles {
    /// Number of handles scan and fan-out go through
    pub fn node_count(&self) -> usize {
        if self.nodes.is_empty() {
            1
        } else {
            self.nodes.len()
        }
    }

    /// Handle of node `index`; the command handle on a single node
    pub fn node(&mut self, index: usize) -> Option<&mut (dyn NativeHandle + 'static)> {
        if self.nodes.is_empty() {
            return if index == 0 { Some(self.command.as_mut()) } else { None };
        }
        self.nodes.get_mut(index).map(|handle| handle.as_mut())
    }

    pub fn close(&mut self) {
        self.command.close();
        for node in &mut self.nodes {
            node.close();
        }
    }
}

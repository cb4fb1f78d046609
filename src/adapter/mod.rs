//! Adapter
//!
//! Owns the native handles of one logical connection. The handle lifecycle,
//! the command executor and the scan iterator all live here; the
//! [`Connection`](crate::connection::Connection) facade is the only caller.

mod executor;
mod lifecycle;
mod parking;
mod scan;
mod topology;

pub use executor::Execution;
pub use scan::Scan;
pub use topology::Topology;

use crate::config::ConnectionConfig;
use crate::native::Connector;
use std::sync::Arc;
use topology::Handles;

/// Handle lifecycle, command execution and key scanning for one connection
pub struct Adapter {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    topology: Topology,
    handles: Option<Handles>,
}

impl Adapter {
    /// Adapter for `config`; nothing is opened until the first connect
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        let topology = Topology::for_config(&config);
        Adapter {
            config,
            connector,
            topology,
            handles: None,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Prefix applied to every key
    pub fn prefix(&self) -> &[u8] {
        self.config.key_prefix.as_bytes()
    }
}

impl Drop for Adapter {
    fn drop(&mut self) {
        self.disconnect();
    }
}

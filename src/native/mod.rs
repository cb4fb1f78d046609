//! Native handles
//!
//! A native handle is one live connection to one store node (or, for a
//! cluster, one routing connection over all of them). Connectors open
//! handles; everything above this module talks to them through the two
//! traits below and never sees the concrete client.

pub mod memory;
pub mod remote;

use crate::config::{ConnectionConfig, Endpoint};
use crate::error::NativeError;
use crate::protocol::RespValue;
use bytes::Bytes;

pub use self::memory::MemoryConnector;
pub use self::remote::RedisConnector;

/// One live connection
///
/// Failures reported by the store itself come back as an error reply and
/// set the last-error flag; only transport failures are returned as `Err`.
pub trait NativeHandle: Send {
    /// Send one command and read its reply
    fn call(&mut self, name: &str, args: &[Bytes]) -> Result<RespValue, NativeError>;

    /// Message of the last error reply, if not yet cleared
    fn last_error(&self) -> Option<&str>;

    fn clear_last_error(&mut self);

    /// Close the underlying connection
    fn close(&mut self);
}

/// Opens native handles for a configuration
pub trait Connector: Send + Sync {
    /// Connection to a single node
    fn open(
        &self,
        endpoint: &Endpoint,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn NativeHandle>, NativeError>;

    /// Routing connection over all `nodes` of a cluster
    ///
    /// Credentials are applied by the connector itself, the routing handle
    /// does not accept AUTH or SELECT.
    fn open_cluster(
        &self,
        nodes: &[Endpoint],
        config: &ConnectionConfig,
    ) -> Result<Box<dyn NativeHandle>, NativeError>;
}

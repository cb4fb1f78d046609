//! In-process store
//!
//! A small Redis-compatible store living inside the process: nodes are
//! created on first use and shared by every handle opened on the same
//! endpoint through the same connector. Useful for tests and for running
//! without a server.

pub mod commands;
pub mod entry;
pub mod node;
pub mod pattern;
pub mod router;
pub mod store;
pub mod value;

use self::commands::{dispatch, CommandContext};
use self::node::{Credentials, MemoryNode, Session, SharedNode};
use self::router::NodeRouter;
use super::{Connector, NativeHandle};
use crate::command::CommandName;
use crate::config::{ConnectionConfig, Endpoint};
use crate::error::NativeError;
use crate::protocol::RespValue;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::debug;

/// Opens handles on in-process nodes
#[derive(Default)]
pub struct MemoryConnector {
    nodes: Mutex<HashMap<Endpoint, SharedNode>>,
    credentials: Option<Credentials>,
    unreachable: Mutex<HashSet<Endpoint>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes created by this connector require these credentials
    pub fn with_credentials(mut self, username: Option<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username,
            password: password.into(),
        });
        self
    }

    /// Make `endpoint` refuse (or accept again) new connections
    pub fn set_reachable(&self, endpoint: &Endpoint, reachable: bool) {
        let mut unreachable = self.unreachable.lock();
        if reachable {
            unreachable.remove(endpoint);
        } else {
            unreachable.insert(endpoint.clone());
        }
    }

    /// The node behind `endpoint`, created on first use
    pub fn node(&self, endpoint: &Endpoint) -> SharedNode {
        self.nodes
            .lock()
            .entry(endpoint.clone())
            .or_insert_with(|| MemoryNode::shared(endpoint.to_string(), self.credentials.clone()))
            .clone()
    }

    fn reachable_node(&self, endpoint: &Endpoint) -> Result<SharedNode, NativeError> {
        if self.unreachable.lock().contains(endpoint) {
            return Err(NativeError::with_cause(
                format!("Failed to connect to {}", endpoint),
                NativeError::new("Connection refused"),
            ));
        }
        Ok(self.node(endpoint))
    }
}

impl Connector for MemoryConnector {
    fn open(
        &self,
        endpoint: &Endpoint,
        _config: &ConnectionConfig,
    ) -> Result<Box<dyn NativeHandle>, NativeError> {
        let node = self.reachable_node(endpoint)?;
        debug!("Opening in-memory node {}", endpoint);
        Ok(Box::new(MemoryHandle::connect(node)))
    }

    fn open_cluster(
        &self,
        nodes: &[Endpoint],
        config: &ConnectionConfig,
    ) -> Result<Box<dyn NativeHandle>, NativeError> {
        let mut links = Vec::with_capacity(nodes.len());
        for endpoint in nodes {
            let link = Link::connect(self.reachable_node(endpoint)?);
            links.push(link);
        }

        let mut router = RouterHandle::new(links);
        if let Some(password) = &config.password {
            let mut args = Vec::new();
            if let Some(username) = &config.username {
                args.push(Bytes::from(username.clone()));
            }
            args.push(Bytes::from(password.clone()));
            for link in &mut router.links {
                if let RespValue::Error(message) = link.run(CommandName::Auth, &args)? {
                    return Err(NativeError::with_cause(
                        "Failed to connect to cluster",
                        NativeError::new(message),
                    ));
                }
            }
        }
        debug!("Opened in-memory cluster over {} nodes", nodes.len());
        Ok(Box::new(router))
    }
}

/// One client session on one node
struct Link {
    node: SharedNode,
    session: Session,
}

impl Link {
    fn connect(node: SharedNode) -> Self {
        let session = node.lock().connect_client();
        Link { node, session }
    }

    fn run(&mut self, name: CommandName, args: &[Bytes]) -> Result<RespValue, NativeError> {
        let mut node = self.node.lock();
        if !node.has_client(self.session.id) {
            return Err(NativeError::with_cause(
                "Connection lost",
                NativeError::new("Connection reset by peer"),
            ));
        }
        let mut ctx = CommandContext::new(&mut *node, &mut self.session);
        Ok(dispatch(&mut ctx, name, args))
    }

}

impl Drop for Link {
    fn drop(&mut self) {
        self.node.lock().disconnect_client(self.session.id);
    }
}

/// Catalog lookup; unknown names get the server's error reply
fn lookup(name: &str) -> Result<CommandName, RespValue> {
    CommandName::from_str(name).map_err(|err| RespValue::error(err.message()))
}

/// A connection to one in-memory node
pub struct MemoryHandle {
    link: Option<Link>,
    last_error: Option<String>,
}

impl MemoryHandle {
    fn connect(node: SharedNode) -> Self {
        MemoryHandle {
            link: Some(Link::connect(node)),
            last_error: None,
        }
    }
}

/// Remember an error reply as the last error
fn record(last_error: &mut Option<String>, reply: RespValue) -> RespValue {
    if let RespValue::Error(message) = &reply {
        *last_error = Some(message.clone());
    }
    reply
}

impl NativeHandle for MemoryHandle {
    fn call(&mut self, name: &str, args: &[Bytes]) -> Result<RespValue, NativeError> {
        let link = self
            .link
            .as_mut()
            .ok_or_else(|| NativeError::new("Connection is closed"))?;
        let reply = match lookup(name) {
            Ok(command) => link.run(command, args)?,
            Err(reply) => reply,
        };
        Ok(record(&mut self.last_error, reply))
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

/// Routing connection over the nodes of an in-memory cluster
///
/// Commands go to the node owning their keys; keyless commands go to the
/// first node. Keys owned by different nodes are refused with CROSSSLOT.
pub struct RouterHandle {
    router: NodeRouter,
    links: Vec<Link>,
    open: bool,
    last_error: Option<String>,
}

impl RouterHandle {
    fn new(links: Vec<Link>) -> Self {
        RouterHandle {
            router: NodeRouter::new(links.len()),
            links,
            open: true,
            last_error: None,
        }
    }

    fn route(&mut self, command: CommandName, args: &[Bytes]) -> Result<RespValue, NativeError> {
        if matches!(command, CommandName::Auth | CommandName::Select) {
            return Ok(RespValue::error(format!(
                "ERR {} is not allowed in cluster mode",
                command.as_str()
            )));
        }

        let mut owners = command
            .key_positions(args)
            .into_iter()
            .map(|i| self.router.node_for(&args[i]));
        let owner = match owners.next() {
            Some(first) if owners.all(|other| other == first) => first,
            Some(_) => {
                return Ok(RespValue::error(
                    "CROSSSLOT Keys in request don't hash to the same slot",
                ))
            }
            None => 0,
        };

        match self.links.get_mut(owner) {
            Some(link) => link.run(command, args),
            None => Err(NativeError::new("Cluster has no nodes")),
        }
    }
}

impl NativeHandle for RouterHandle {
    fn call(&mut self, name: &str, args: &[Bytes]) -> Result<RespValue, NativeError> {
        if !self.open {
            return Err(NativeError::new("Connection is closed"));
        }
        let reply = match lookup(name) {
            Ok(command) => self.route(command, args)?,
            Err(reply) => reply,
        };
        Ok(record(&mut self.last_error, reply))
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    fn close(&mut self) {
        self.open = false;
        self.links.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<Bytes> {
        values.iter().map(|v| Bytes::copy_from_slice(v.as_bytes())).collect()
    }

    fn endpoint(name: &str) -> Endpoint {
        Endpoint::Tcp { host: name.into(), port: 6379 }
    }

    #[test]
    fn test_handles_share_a_node() {
        let connector = MemoryConnector::new();
        let config = ConnectionConfig::memory("n1");
        let mut a = connector.open(&endpoint("n1"), &config).unwrap();
        let mut b = connector.open(&endpoint("n1"), &config).unwrap();

        a.call("SET", &args(&["k", "v"])).unwrap();
        assert_eq!(b.call("get", &args(&["k"])).unwrap(), RespValue::bulk_string("v"));
    }

    #[test]
    fn test_error_reply_sets_last_error() {
        let connector = MemoryConnector::new();
        let mut handle = connector.open(&endpoint("n1"), &ConnectionConfig::memory("n1")).unwrap();

        let reply = handle.call("RENAME", &args(&["missing", "other"])).unwrap();
        assert_eq!(reply, RespValue::error("ERR no such key"));
        assert_eq!(handle.last_error(), Some("ERR no such key"));

        handle.clear_last_error();
        assert_eq!(handle.last_error(), None);

        let reply = handle.call("NOPE", &[]).unwrap();
        assert_eq!(reply, RespValue::error("ERR unknown command 'NOPE'"));
    }

    #[test]
    fn test_unreachable_endpoint() {
        let connector = MemoryConnector::new();
        connector.set_reachable(&endpoint("down"), false);
        let err = connector
            .open(&endpoint("down"), &ConnectionConfig::memory("down"))
            .err()
            .unwrap();
        assert_eq!(err.message(), "Failed to connect to down:6379");
        assert_eq!(err.root().message(), "Connection refused");
    }

    #[test]
    fn test_killed_client_is_transport_error() {
        let connector = MemoryConnector::new();
        let config = ConnectionConfig::memory("n1");
        let mut victim = connector.open(&endpoint("n1"), &config).unwrap();
        let mut admin = connector.open(&endpoint("n1"), &config).unwrap();

        let id = victim.call("CLIENT", &args(&["ID"])).unwrap().as_integer().unwrap();
        admin
            .call("CLIENT", &args(&["KILL", "ID", &id.to_string()]))
            .unwrap();

        let err = victim.call("PING", &[]).err().unwrap();
        assert_eq!(err.root().message(), "Connection reset by peer");
    }

    #[test]
    fn test_close_unregisters_client() {
        let connector = MemoryConnector::new();
        let mut handle = connector.open(&endpoint("n1"), &ConnectionConfig::memory("n1")).unwrap();
        assert_eq!(connector.node(&endpoint("n1")).lock().clients().count(), 1);

        handle.close();
        assert_eq!(connector.node(&endpoint("n1")).lock().clients().count(), 0);
        assert!(handle.call("PING", &[]).is_err());
    }

    #[test]
    fn test_cluster_routing() {
        let connector = MemoryConnector::new();
        let nodes = vec![endpoint("c1"), endpoint("c2"), endpoint("c3")];
        let config = ConnectionConfig::memory("c1").with_cluster_nodes(["c2", "c3"]);
        let mut router = connector.open_cluster(&nodes, &config).unwrap();

        for i in 0..30 {
            let key = format!("key:{}", i);
            router.call("SET", &args(&[&key, "v"])).unwrap();
        }
        let total: usize = nodes
            .iter()
            .map(|e| connector.node(e).lock().key_count(0))
            .sum();
        assert_eq!(total, 30);
        assert!(nodes.iter().all(|e| connector.node(e).lock().key_count(0) > 0));

        assert_eq!(
            router.call("GET", &args(&["key:7"])).unwrap(),
            RespValue::bulk_string("v")
        );
        assert_eq!(
            router.call("MSET", &args(&["{t}a", "1", "{t}b", "2"])).unwrap(),
            RespValue::ok()
        );
        assert!(router.call("SELECT", &args(&["1"])).unwrap().is_error());
    }

    #[test]
    fn test_cluster_open_failure_releases_sessions() {
        let connector = MemoryConnector::new();
        let nodes = [endpoint("c1"), endpoint("c2"), endpoint("c3")];
        connector.set_reachable(&nodes[2], false);

        assert!(connector.open_cluster(&nodes, &ConnectionConfig::memory("c1")).is_err());
        for node in &nodes[..2] {
            assert_eq!(connector.node(node).lock().clients().count(), 0);
        }
    }

    #[test]
    fn test_cluster_crossslot() {
        let connector = MemoryConnector::new();
        let nodes = vec![endpoint("c1"), endpoint("c2")];
        let config = ConnectionConfig::memory("c1").with_cluster_nodes(["c2"]);
        let mut router = connector.open_cluster(&nodes, &config).unwrap();

        let keys: Vec<String> = (0..20).map(|i| format!("k{}", i)).collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let reply = router.call("DEL", &args(&refs)).unwrap();
        assert_eq!(
            reply,
            RespValue::error("CROSSSLOT Keys in request don't hash to the same slot")
        );
        assert!(router.last_error().unwrap().starts_with("CROSSSLOT"));
    }

    #[test]
    fn test_cluster_auth() {
        let connector = MemoryConnector::new().with_credentials(None, "secret");
        let nodes = vec![endpoint("c1"), endpoint("c2")];

        let bad = ConnectionConfig::memory("c1")
            .with_cluster_nodes(["c2"])
            .with_credentials(None, "wrong");
        let err = connector.open_cluster(&nodes, &bad).err().unwrap();
        assert!(err.root().message().starts_with("WRONGPASS"));

        let good = ConnectionConfig::memory("c1")
            .with_cluster_nodes(["c2"])
            .with_credentials(None, "secret");
        let mut router = connector.open_cluster(&nodes, &good).unwrap();
        assert_eq!(router.call("SET", &args(&["k", "v"])).unwrap(), RespValue::ok());
    }
}

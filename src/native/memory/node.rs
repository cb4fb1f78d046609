//! One in-memory store node
//!
//! A node plays the part of a server: it owns the databases, the optional
//! required credentials and the table of connected clients.

use super::store::Keyspace;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Number of databases per node, as in a default Redis server
pub const DATABASES: usize = 16;

/// Node shared between all the handles connected to it
pub type SharedNode = Arc<Mutex<MemoryNode>>;

/// Credentials a node requires before accepting commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// None for the default user
    pub username: Option<String>,
    pub password: String,
}

/// Server-side view of one connected client
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub name: Option<Bytes>,
    pub db: usize,
    pub last_command: &'static str,
}

/// Per-connection state
#[derive(Debug, Clone)]
pub struct Session {
    pub id: u64,
    pub db: usize,
    pub authenticated: bool,
}

/// An in-process store node
pub struct MemoryNode {
    name: String,
    databases: Vec<Keyspace>,
    credentials: Option<Credentials>,
    clients: BTreeMap<u64, ClientRecord>,
    next_client_id: u64,
}

impl MemoryNode {
    pub fn new(name: impl Into<String>, credentials: Option<Credentials>) -> Self {
        MemoryNode {
            name: name.into(),
            databases: (0..DATABASES).map(|_| Keyspace::new()).collect(),
            credentials,
            clients: BTreeMap::new(),
            next_client_id: 1,
        }
    }

    pub fn shared(name: impl Into<String>, credentials: Option<Credentials>) -> SharedNode {
        Arc::new(Mutex::new(Self::new(name, credentials)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a new client connection
    pub fn connect_client(&mut self) -> Session {
        let id = self.next_client_id;
        self.next_client_id += 1;
        self.clients.insert(
            id,
            ClientRecord {
                name: None,
                db: 0,
                last_command: "",
            },
        );
        Session {
            id,
            db: 0,
            authenticated: self.credentials.is_none(),
        }
    }

    pub fn disconnect_client(&mut self, id: u64) -> bool {
        self.clients.remove(&id).is_some()
    }

    pub fn has_client(&self, id: u64) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn client(&self, id: u64) -> Option<&ClientRecord> {
        self.clients.get(&id)
    }

    pub fn client_mut(&mut self, id: u64) -> Option<&mut ClientRecord> {
        self.clients.get_mut(&id)
    }

    pub fn clients(&self) -> impl Iterator<Item = (&u64, &ClientRecord)> {
        self.clients.iter()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Database `index`
    pub fn database(&mut self, index: usize) -> &mut Keyspace {
        &mut self.databases[index]
    }

    /// Live keys in database `index`
    pub fn key_count(&self, index: usize) -> usize {
        self.databases[index].len()
    }

    /// Keyspace lines for INFO, non-empty databases only
    pub fn keyspace(&self) -> Vec<(usize, usize, usize)> {
        self.databases
            .iter()
            .enumerate()
            .filter(|(_, db)| !db.is_empty())
            .map(|(i, db)| (i, db.len(), db.volatile_len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ids_increase() {
        let mut node = MemoryNode::new("n1", None);
        let a = node.connect_client();
        let b = node.connect_client();
        assert!(b.id > a.id);
        assert!(a.authenticated);
        assert!(node.disconnect_client(a.id));
        assert!(!node.has_client(a.id));
        assert!(node.has_client(b.id));
    }

    #[test]
    fn test_credentials_require_auth() {
        let creds = Credentials { username: None, password: "secret".into() };
        let mut node = MemoryNode::new("n1", Some(creds));
        assert!(!node.connect_client().authenticated);
    }
}

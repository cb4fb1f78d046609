//! Tests against a live Redis server
//!
//! Run with `FERRUMLINK_REDIS_URL=127.0.0.1:6379 cargo test -- --ignored`.
//! They only touch keys under their own prefix in database 15.

use bytes::Bytes;
use ferrumlink::config::Endpoint;
use ferrumlink::{
    AdapterResolver, Connection, ConnectionConfig, ConnectionRegistry, ErrorKind, Expiry, RecordingSink,
    RegistryConfig,
};
use std::sync::Arc;

fn config(prefix: &str) -> ConnectionConfig {
    let address = std::env::var("FERRUMLINK_REDIS_URL").unwrap_or_else(|_| "127.0.0.1:6379".into());
    let (host, port) = match Endpoint::parse(&address).unwrap() {
        Endpoint::Tcp { host, port } => (host, port),
        Endpoint::Unix(_) => panic!("FERRUMLINK_REDIS_URL must be host:port"),
    };
    ConnectionConfig::tcp(host)
        .with_port(port)
        .with_database(15)
        .with_prefix(prefix)
        .with_timeouts(Some(2.0), Some(2.0))
}

fn registry(prefix: &str) -> (ConnectionRegistry, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let config = RegistryConfig::new().with_connection("live", config(prefix));
    (ConnectionRegistry::new(config).with_sink(sink.clone()), sink)
}

#[test]
#[ignore]
fn test_set_get_and_ttl() {
    let (mut registry, sink) = registry("ferrumlink-it-basic:");
    let conn = registry.connection("live").unwrap();
    conn.flush_keys(100).unwrap();

    conn.set("k", "v").unwrap();
    assert_eq!(conn.get("k").unwrap(), Some(Bytes::from("v")));
    assert_eq!(conn.get("never").unwrap(), None);
    assert_eq!(conn.ttl("k").unwrap(), Expiry::NoExpiry);
    assert_eq!(conn.ttl("never").unwrap(), Expiry::Missing);
    assert!(conn.expire("k", 100).unwrap());
    assert!(matches!(conn.pttl("k").unwrap(), Expiry::Set(ms) if ms > 0));

    assert!(!sink.commands().is_empty());
    assert_eq!(conn.flush_keys(100).unwrap(), 1);
}

#[test]
#[ignore]
fn test_prefixed_scan() {
    let (mut registry, _) = registry("ferrumlink-it-scan:");
    let conn = registry.connection("live").unwrap();
    conn.flush_keys(100).unwrap();
    conn.mset([("a5", 5)]).unwrap();

    let keys: Vec<Bytes> = conn.scan(Some("a*"), None, false).unwrap().map(|k| k.unwrap()).collect();
    assert_eq!(keys, vec![Bytes::from("a5")]);
    let keys: Vec<Bytes> = conn.scan(Some("a*"), None, true).unwrap().map(|k| k.unwrap()).collect();
    assert_eq!(keys, vec![Bytes::from("ferrumlink-it-scan:a5")]);

    assert_eq!(conn.flush_keys(10).unwrap(), 1);
}

#[test]
#[ignore]
fn test_server_errors() {
    let (mut registry, _) = registry("ferrumlink-it-errors:");
    let conn = registry.connection("live").unwrap();
    let err = conn.rename("missing", "dest").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Command);
    assert!(err.to_string().contains("no such key"));
}

#[test]
#[ignore]
fn test_refused_connection() {
    let config = ConnectionConfig::tcp("127.0.0.1").with_port(1).with_timeouts(Some(1.0), None);
    let adapter = AdapterResolver::new().resolve(&config).unwrap();
    let mut conn = Connection::new("refused", adapter, Arc::new(RecordingSink::new()));

    let err = conn.connect().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.root_cause().is_some());
}

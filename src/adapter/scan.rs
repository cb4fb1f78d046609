//! Prefix-aware key scan over every node
//!
//! Each node is walked with SCAN until its cursor comes back to 0, then the
//! next node starts. The key prefix is folded into the MATCH pattern so the
//! filtering happens server-side.

use super::executor::send;
use super::Adapter;
use crate::error::{ClientError, Result};
use crate::protocol::RespValue;
use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use tracing::debug;

/// Lazy sequence of keys
///
/// Holds the adapter exclusively until dropped. Dropping it early is fine:
/// no state outlives the iterator.
pub struct Scan<'a> {
    adapter: &'a mut Adapter,
    pattern: Option<Bytes>,
    count: Option<usize>,
    strip: usize,
    retry_empty: bool,
    node: usize,
    /// None until the first SCAN on the current node
    cursor: Option<u64>,
    pending: VecDeque<Bytes>,
    finished: bool,
}

impl Adapter {
    /// Scan the keys matching `pattern` (relative to the key prefix)
    ///
    /// `count` is a hint passed to the server. With `include_prefix` the
    /// keys are yielded exactly as stored, otherwise the prefix is cut off.
    pub fn scan(
        &mut self,
        pattern: Option<&str>,
        count: Option<usize>,
        include_prefix: bool,
    ) -> Result<Scan<'_>> {
        self.connect()?;

        let prefix = self.prefix();
        let pattern = match pattern {
            Some(pattern) => Some(prefixed(prefix, pattern.as_bytes())),
            None if !prefix.is_empty() => Some(prefixed(prefix, b"*")),
            None => None,
        };
        let strip = if include_prefix { 0 } else { prefix.len() };
        let retry_empty = self.config.scan_retry;

        Ok(Scan {
            adapter: self,
            pattern,
            count,
            strip,
            retry_empty,
            node: 0,
            cursor: None,
            pending: VecDeque::new(),
            finished: false,
        })
    }
}

fn prefixed(prefix: &[u8], pattern: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(prefix.len() + pattern.len());
    buf.extend_from_slice(prefix);
    buf.extend_from_slice(pattern);
    buf.freeze()
}

impl<'a> Scan<'a> {
    /// Next batch as returned by one SCAN call, None once every node is done
    ///
    /// When `scan_retry` is off an intermediate batch may be empty.
    pub fn next_batch(&mut self) -> Option<Result<Vec<Bytes>>> {
        if self.finished {
            return None;
        }
        loop {
            match self.fetch() {
                Ok(Some(batch)) if batch.is_empty() && self.retry_empty => continue,
                Ok(Some(batch)) => return Some(Ok(batch)),
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }

    /// One SCAN round-trip; None when all nodes are exhausted
    fn fetch(&mut self) -> Result<Option<Vec<Bytes>>> {
        let handles = self
            .adapter
            .handles
            .as_mut()
            .ok_or_else(|| ClientError::connection("Not connected"))?;

        // Advance past exhausted nodes
        while self.cursor == Some(0) {
            self.node += 1;
            self.cursor = None;
        }
        if self.node >= handles.node_count() {
            return Ok(None);
        }
        let handle = match handles.node(self.node) {
            Some(handle) => handle,
            None => return Ok(None),
        };

        let mut args = vec![Bytes::from(self.cursor.unwrap_or(0).to_string())];
        if let Some(pattern) = &self.pattern {
            args.push(Bytes::from_static(b"MATCH"));
            args.push(pattern.clone());
        }
        if let Some(count) = self.count {
            args.push(Bytes::from_static(b"COUNT"));
            args.push(Bytes::from(count.to_string()));
        }

        let reply = send(handle, "SCAN", &args)?;
        let (cursor, keys) = parse_reply(reply)?;
        debug!("SCAN node {} returned {} keys, cursor {}", self.node, keys.len(), cursor);
        self.cursor = Some(cursor);

        let strip = self.strip;
        Ok(Some(
            keys.into_iter()
                .map(|key| key.slice(strip.min(key.len())..))
                .collect(),
        ))
    }
}

/// `[cursor, [key, ...]]`
fn parse_reply(reply: RespValue) -> Result<(u64, Vec<Bytes>)> {
    let malformed = || ClientError::command("Malformed SCAN reply");

    let mut parts = reply.into_array().ok_or_else(malformed)?.into_iter();
    let cursor = parts
        .next()
        .as_ref()
        .and_then(RespValue::as_str)
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(malformed)?;
    let keys = parts
        .next()
        .and_then(RespValue::into_array)
        .ok_or_else(malformed)?
        .into_iter()
        .map(|key| key.into_bytes().ok_or_else(malformed))
        .collect::<Result<Vec<_>>>()?;
    Ok((cursor, keys))
}

impl<'a> Iterator for Scan<'a> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.pending.pop_front() {
                return Some(Ok(key));
            }
            match self.next_batch()? {
                Ok(batch) => self.pending.extend(batch),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandName};
    use crate::adapter::Execution;
    use crate::config::ConnectionConfig;
    use crate::native::MemoryConnector;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn filled(config: ConnectionConfig, keys: &[&str]) -> Adapter {
        let mut adapter = Adapter::new(config, Arc::new(MemoryConnector::new()));
        for key in keys {
            let set = Command::new(CommandName::Set).arg(*key).arg("v");
            adapter.execute(&set, Execution::Validated).unwrap();
        }
        adapter
    }

    fn collect(scan: Scan<'_>) -> Vec<String> {
        let mut keys: Vec<String> = scan
            .map(|key| String::from_utf8(key.unwrap().to_vec()).unwrap())
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_prefix_stripped_or_kept() {
        let config = ConnectionConfig::memory("n1").with_prefix("conn1:");
        let mut adapter = filled(config, &["a5", "b7"]);

        assert_eq!(collect(adapter.scan(Some("a*"), None, false).unwrap()), ["a5"]);
        assert_eq!(collect(adapter.scan(Some("a*"), None, true).unwrap()), ["conn1:a5"]);
    }

    #[test]
    fn test_missing_pattern_with_prefix_matches_prefix_only() {
        let mut adapter = filled(ConnectionConfig::memory("n1").with_prefix("p:"), &["x", "y"]);
        let set = Command::new(CommandName::Set).arg("other:z").arg("v");
        adapter.execute(&set, Execution::Raw).unwrap();

        assert_eq!(collect(adapter.scan(None, None, false).unwrap()), ["x", "y"]);
    }

    #[test]
    fn test_every_key_regardless_of_count() {
        let names: Vec<String> = (0..57).map(|i| format!("key:{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut adapter = filled(ConnectionConfig::memory("n1"), &refs);

        for count in [1, 3, 10, 1000] {
            let seen: HashSet<String> = collect(adapter.scan(None, Some(count), false).unwrap())
                .into_iter()
                .collect();
            assert_eq!(seen.len(), 57, "count {}", count);
        }
    }

    #[test]
    fn test_scan_walks_every_node() {
        let names: Vec<String> = (0..40).map(|i| format!("k{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let config = ConnectionConfig::memory("c1").with_cluster_nodes(["c2", "c3"]);
        let mut adapter = filled(config, &refs);

        let keys = collect(adapter.scan(None, Some(5), false).unwrap());
        assert_eq!(keys.len(), 40);
    }

    #[test]
    fn test_empty_batches_without_retry() {
        let names: Vec<String> = (0..30).map(|i| format!("key:{}", i)).collect();
        let mut refs: Vec<&str> = names.iter().map(String::as_str).collect();
        refs.push("needle");
        let config = ConnectionConfig::memory("n1").with_scan_retry(false);
        let mut adapter = filled(config, &refs);

        let mut scan = adapter.scan(Some("needle"), Some(1), false).unwrap();
        let mut batches = 0;
        let mut found = Vec::new();
        while let Some(batch) = scan.next_batch() {
            batches += 1;
            found.extend(batch.unwrap());
        }
        assert_eq!(batches, 31);
        assert_eq!(found, vec![Bytes::from("needle")]);
    }

    #[test]
    fn test_empty_batches_retried() {
        let names: Vec<String> = (0..30).map(|i| format!("key:{}", i)).collect();
        let mut refs: Vec<&str> = names.iter().map(String::as_str).collect();
        refs.push("needle");
        let mut adapter = filled(ConnectionConfig::memory("n1"), &refs);

        let mut scan = adapter.scan(Some("needle"), Some(1), false).unwrap();
        let first = scan.next_batch().unwrap().unwrap();
        assert_eq!(first, vec![Bytes::from("needle")]);
        assert!(scan.next_batch().is_none());
    }

    #[test]
    fn test_scan_on_empty_store() {
        let mut adapter = filled(ConnectionConfig::memory("n1"), &[]);
        assert!(adapter.scan(None, None, false).unwrap().next().is_none());
    }

    #[test]
    fn test_parse_reply_rejects_garbage() {
        assert!(parse_reply(RespValue::integer(3)).is_err());
        let bad_cursor = RespValue::array(vec![RespValue::bulk_string("x"), RespValue::array(vec![])]);
        assert!(parse_reply(bad_cursor).is_err());
    }
}

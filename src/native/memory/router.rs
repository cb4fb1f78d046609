//! Key routing for multi-node memory topologies
//!
//! Routes keys to nodes by SipHash. Like Redis Cluster, only the hash tag
//! (`{...}`) of a key is hashed when it has one, so related keys can be
//! pinned to the same node.

use std::hash::Hasher;
use siphasher::sip::SipHasher13;

/// Maps keys onto `node_count` nodes
#[derive(Debug, Clone)]
pub struct NodeRouter {
    node_count: usize,
}

impl NodeRouter {
    /// Router over `node_count` nodes, at least one
    pub fn new(node_count: usize) -> Self {
        NodeRouter {
            node_count: node_count.max(1),
        }
    }

    /// Index of the node owning `key`
    pub fn node_for(&self, key: &[u8]) -> usize {
        (hash_key(hash_tag(key)) % self.node_count as u64) as usize
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }
}

/// The part of the key that is hashed
fn hash_tag(key: &[u8]) -> &[u8] {
    if let Some(open) = key.iter().position(|&b| b == b'{') {
        if let Some(len) = key[open + 1..].iter().position(|&b| b == b'}') {
            if len > 0 {
                return &key[open + 1..open + 1 + len];
            }
        }
    }
    key
}

/// SipHash13 of raw key bytes, also the SCAN ordering
pub fn hash_key(key: &[u8]) -> u64 {
    let mut hasher = SipHasher13::new();
    hasher.write(key);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_over_nodes() {
        let router = NodeRouter::new(3);
        let mut per_node = [0usize; 3];
        for i in 0..900 {
            per_node[router.node_for(format!("user:{}", i).as_bytes())] += 1;
        }
        for count in per_node {
            assert!(count > 200 && count < 400, "Uneven distribution: {}", count);
        }
        assert_eq!(router.node_for(b"user:1"), router.node_for(b"user:1"));
    }

    #[test]
    fn test_hash_tags() {
        let router = NodeRouter::new(8);
        assert_eq!(router.node_for(b"{user1}:name"), router.node_for(b"{user1}:email"));
        assert_eq!(hash_tag(b"{}key"), b"{}key");
        assert_eq!(hash_tag(b"a{b}c"), b"b");
    }

    #[test]
    fn test_zero_nodes_means_one() {
        let router = NodeRouter::new(0);
        assert_eq!(router.node_count(), 1);
        assert_eq!(router.node_for(b"any_key"), 0);
    }
}

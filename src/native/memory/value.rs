//! Values held by the in-memory store
//!
//! Counters are plain strings parsed on use, the way the server stores them.

use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
    Hash(HashMap<Bytes, Bytes>),
}

/// Empty constructor plus shared and mutable views for one collection type
macro_rules! collection {
    ($variant:ident, $ty:ty, $empty:ident, $view:ident, $view_mut:ident) => {
        pub fn $empty() -> Self {
            Value::$variant(<$ty>::new())
        }

        pub fn $view(&self) -> Option<&$ty> {
            match self {
                Value::$variant(inner) => Some(inner),
                _ => None,
            }
        }

        pub fn $view_mut(&mut self) -> Option<&mut $ty> {
            match self {
                Value::$variant(inner) => Some(inner),
                _ => None,
            }
        }
    };
}

impl Value {
    pub fn string(bytes: impl Into<Bytes>) -> Self {
        Value::String(bytes.into())
    }

    pub fn as_string(&self) -> Option<&Bytes> {
        match self {
            Value::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    collection!(List, VecDeque<Bytes>, empty_list, as_list, as_list_mut);
    collection!(Set, HashSet<Bytes>, empty_set, as_set, as_set_mut);
    collection!(Hash, HashMap<Bytes, Bytes>, empty_hash, as_hash, as_hash_mut);

    /// Name reported by TYPE and matched by SCAN ... TYPE
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Hash(_) => "hash",
        }
    }

    /// Collections are removed from the keyspace once empty
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::List(list) => list.is_empty(),
            Value::Set(set) => set.is_empty(),
            Value::Hash(hash) => hash.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_match_variant() {
        let mut list = Value::empty_list();
        list.as_list_mut().unwrap().push_back(Bytes::from("a"));
        assert_eq!(list.as_list().unwrap().len(), 1);
        assert!(list.as_set().is_none());
        assert!(list.as_hash_mut().is_none());
        assert_eq!(list.type_name(), "list");
    }

    #[test]
    fn test_empty_collection() {
        assert!(Value::empty_hash().is_empty_collection());
        assert!(!Value::string("").is_empty_collection());
    }
}

//! One database of the in-memory store

use super::entry::{now_ms, Entry};
use super::value::Value;
use bytes::Bytes;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

type Entries = HashMap<Bytes, Entry, BuildHasherDefault<SipHasher13>>;

/// Key space of one database
///
/// Expiration is lazy: an expired entry is dropped the first time it is
/// looked up.
pub struct Keyspace {
    entries: Entries,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Keyspace {
            entries: HashMap::with_capacity_and_hasher(
                capacity,
                BuildHasherDefault::<SipHasher13>::default(),
            ),
        }
    }

    /// Drop `key` if it has expired
    fn purge_expired(&mut self, key: &[u8]) {
        let expired = self.entries.get(key).map(Entry::is_expired).unwrap_or(false);
        if expired {
            self.entries.remove(key);
        }
    }

    /// Set a value, clearing any expiration; returns true if the key is new
    pub fn set(&mut self, key: impl Into<Bytes>, value: Value) -> bool {
        let key = key.into();
        self.purge_expired(&key);
        self.entries.insert(key, Entry::new(value)).is_none()
    }

    /// Replace the value, keeping the expiration
    pub fn set_keep_ttl(&mut self, key: impl Into<Bytes>, value: Value) {
        let key = key.into();
        self.purge_expired(&key);
        match self.entries.get_mut(&key) {
            Some(entry) => entry.value = value,
            None => {
                self.entries.insert(key, Entry::new(value));
            }
        }
    }

    /// Get a value by key, None if not found or expired
    pub fn get(&mut self, key: &[u8]) -> Option<&Value> {
        self.purge_expired(key);
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Get a mutable reference to a value by key
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        self.purge_expired(key);
        self.entries.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Value at `key`, inserting `default()` when missing
    pub fn get_or_insert_with(&mut self, key: &Bytes, default: impl FnOnce() -> Value) -> &mut Value {
        self.purge_expired(key);
        &mut self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(default()))
            .value
    }

    /// Drop `key` when its collection became empty
    pub fn remove_if_empty(&mut self, key: &[u8]) {
        let empty = self
            .entries
            .get(key)
            .map(|entry| entry.value.is_empty_collection())
            .unwrap_or(false);
        if empty {
            self.entries.remove(key);
        }
    }

    /// Delete a key, returns true if the key existed
    pub fn delete(&mut self, key: &[u8]) -> bool {
        match self.entries.remove(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    /// Remove and return the entry
    pub fn take(&mut self, key: &[u8]) -> Option<Entry> {
        self.purge_expired(key);
        self.entries.remove(key)
    }

    /// Insert a whole entry, expiration included
    pub fn put_entry(&mut self, key: Bytes, entry: Entry) {
        self.entries.insert(key, entry);
    }

    /// Check if a key exists (and is not expired)
    pub fn exists(&mut self, key: &[u8]) -> bool {
        self.purge_expired(key);
        self.entries.contains_key(key)
    }

    /// Set an absolute expiration in unix milliseconds
    ///
    /// A deadline in the past deletes the key. Returns false when the key
    /// does not exist.
    pub fn expire_at(&mut self, key: &[u8], at_ms: i64) -> bool {
        self.purge_expired(key);
        if at_ms <= now_ms() {
            return self.entries.remove(key).is_some();
        }
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.expire_at_ms = Some(at_ms);
                true
            }
            None => false,
        }
    }

    /// Current expiration of a key, unix milliseconds
    ///
    /// Returns -2 if the key does not exist, -1 if it has no expiration.
    pub fn expire_time_ms(&mut self, key: &[u8]) -> i64 {
        self.purge_expired(key);
        match self.entries.get(key) {
            Some(entry) => entry.expire_at_ms.unwrap_or(-1),
            None => -2,
        }
    }

    /// Remaining TTL in milliseconds
    ///
    /// Returns -2 if the key does not exist, -1 if it has no expiration.
    pub fn ttl_ms(&mut self, key: &[u8]) -> i64 {
        self.purge_expired(key);
        match self.entries.get(key) {
            Some(entry) => entry.ttl_ms(),
            None => -2,
        }
    }

    /// Remove the expiration; true if there was one
    pub fn persist(&mut self, key: &[u8]) -> bool {
        self.purge_expired(key);
        match self.entries.get_mut(key) {
            Some(entry) => entry.expire_at_ms.take().is_some(),
            None => false,
        }
    }

    /// Remove all keys
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = now_ms();
        self.entries.values().filter(|entry| !entry.is_expired_at(now)).count()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live keys carrying an expiration
    pub fn volatile_len(&self) -> usize {
        let now = now_ms();
        self.entries
            .values()
            .filter(|entry| !entry.is_expired_at(now) && entry.expire_at_ms.is_some())
            .count()
    }

    /// All live keys
    pub fn keys(&self) -> Vec<Bytes> {
        let now = now_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Type name of a live key
    pub fn type_of(&mut self, key: &[u8]) -> Option<&'static str> {
        self.get(key).map(Value::type_name)
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new()
    }
}

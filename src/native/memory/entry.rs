//! Entry structure for key-value pairs

use super::value::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in milliseconds
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// A single entry in the store
#[derive(Debug, Clone)]
pub struct Entry {
    /// The value
    pub value: Value,

    /// Absolute expiration, unix milliseconds
    pub expire_at_ms: Option<i64>,
}

impl Entry {
    /// Create a new entry without expiration
    pub fn new(value: Value) -> Self {
        Entry {
            value,
            expire_at_ms: None,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_ms())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.expire_at_ms, Some(at) if at <= now)
    }

    /// Remaining TTL in milliseconds, -1 without expiration
    pub fn ttl_ms(&self) -> i64 {
        match self.expire_at_ms {
            Some(at) => (at - now_ms()).max(0),
            None => -1,
        }
    }
}

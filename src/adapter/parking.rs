//! Persistent handle slots
//!
//! Handles of persistent connections are parked here on disconnect instead
//! of being closed, and handed back to the next adapter connecting with the
//! same identity through the same connector.

use super::topology::Handles;
use crate::config::ConnectionConfig;
use crate::native::Connector;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Parked handles, newest last
static SLOTS: Lazy<Mutex<HashMap<String, Vec<Handles>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Slot key: the connector instance plus the connection identity
pub(crate) fn slot_key(connector: &Arc<dyn Connector>, config: &ConnectionConfig) -> String {
    let connector = Arc::as_ptr(connector) as *const () as usize;
    format!("{:x}|{}", connector, config.persistent_id())
}

pub(crate) fn park(key: String, handles: Handles) {
    SLOTS.lock().entry(key).or_default().push(handles);
}

pub(crate) fn reclaim(key: &str) -> Option<Handles> {
    let mut slots = SLOTS.lock();
    let parked = slots.get_mut(key)?;
    let handles = parked.pop();
    if parked.is_empty() {
        slots.remove(key);
    }
    handles
}

#[cfg(test)]
pub(crate) fn parked(key: &str) -> usize {
    SLOTS.lock().get(key).map_or(0, Vec::len)
}

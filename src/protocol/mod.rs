//! Reply model
//!
//! Decoded replies as returned by any native handle. The wire protocol itself
//! is handled by the native client, this module only describes its values.

mod types;

pub use types::RespValue;

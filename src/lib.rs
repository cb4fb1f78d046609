//! FerrumLink - A typed client for Redis-compatible key-value servers
//!
//! Layers, from the wire up:
//! - `native`: raw handles to a server (the `redis` crate or an in-process store)
//! - `adapter`: handle lifecycle, command execution and prefix-aware SCAN
//! - `connection`: the instrumented public facade with typed commands
//! - `registry`: named connections built from configuration

pub mod adapter;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod native;
pub mod protocol;
pub mod registry;

/// Re-export commonly used types
pub use command::{Command, CommandName};
pub use config::{AdapterKind, ConnectionConfig, RegistryConfig, SerializationMode};
pub use connection::{Connection, Expiry, KeyScan, StreamEntry};
pub use error::{ClientError, ErrorKind, NativeError, Result};
pub use events::{CommandExecuted, ConnectionEvent, EventSink, RecordingSink, TracingSink};
pub use protocol::RespValue;
pub use registry::{AdapterResolver, ConnectionRegistry};

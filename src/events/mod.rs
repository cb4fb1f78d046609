//! Instrumentation events
//!
//! The facade reports what it did through an [`EventSink`]. Arguments and
//! results are rendered to JSON once, when the event is built; bytes that
//! are not UTF-8 are carried as base64.

use crate::protocol::RespValue;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

/// Something a connection did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConnectionEvent {
    /// A `connect()` call opened the connection
    ConnectionEstablished { connection_name: String },
    /// One command-shaped call completed
    CommandExecuted(CommandExecuted),
}

/// Timing record of one command-shaped call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandExecuted {
    pub connection_name: String,
    pub command_name: String,
    pub args: Vec<Value>,
    pub result: Value,
    pub elapsed_time_nanos: u64,
}

/// Receives the events of every connection
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ConnectionEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::ConnectionEstablished { connection_name } => {
                info!(target: "ferrumlink::events", connection = %connection_name, "connection established");
            }
            ConnectionEvent::CommandExecuted(executed) => {
                let args = Value::Array(executed.args.clone());
                info!(
                    target: "ferrumlink::events",
                    connection = %executed.connection_name,
                    command = %executed.command_name,
                    args = %args,
                    result = %executed.result,
                    elapsed_ns = executed.elapsed_time_nanos,
                    "command executed"
                );
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ConnectionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first
    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.events.lock().clone()
    }

    /// Only the command events
    pub fn commands(&self) -> Vec<CommandExecuted> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ConnectionEvent::CommandExecuted(executed) => Some(executed.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &ConnectionEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &ConnectionEvent) {}
}

/// JSON form of raw bytes: a string when UTF-8, `{"base64": ...}` otherwise
pub fn bytes_to_json(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => json!({ "base64": STANDARD.encode(bytes) }),
    }
}

/// JSON form of a reply
pub fn reply_to_json(reply: &RespValue) -> Value {
    match reply {
        RespValue::SimpleString(s) => Value::String(s.clone()),
        RespValue::Error(e) => json!({ "error": e }),
        RespValue::Integer(i) => json!(i),
        RespValue::BulkString(bytes) => bytes_to_json(bytes),
        RespValue::Null => Value::Null,
        RespValue::Array(items) => Value::Array(items.iter().map(reply_to_json).collect()),
        RespValue::Double(d) => json!(d),
        RespValue::Boolean(b) => Value::Bool(*b),
        RespValue::Map(pairs) => Value::Array(
            pairs
                .iter()
                .map(|(k, v)| Value::Array(vec![reply_to_json(k), reply_to_json(v)]))
                .collect(),
        ),
    }
}

/// JSON form of command arguments
pub fn args_to_json(args: &[Bytes]) -> Vec<Value> {
    args.iter().map(|arg| bytes_to_json(arg)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_json() {
        assert_eq!(bytes_to_json(b"hello"), json!("hello"));
        assert_eq!(bytes_to_json(&[0xff, 0x00]), json!({ "base64": "/wA=" }));
    }

    #[test]
    fn test_reply_to_json() {
        let reply = RespValue::array(vec![
            RespValue::bulk_string("0"),
            RespValue::array(vec![RespValue::bulk_string("a5"), RespValue::Null]),
            RespValue::integer(-2),
        ]);
        assert_eq!(reply_to_json(&reply), json!(["0", ["a5", null], -2]));
        assert_eq!(
            reply_to_json(&RespValue::error("ERR no such key")),
            json!({ "error": "ERR no such key" })
        );
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.emit(&ConnectionEvent::ConnectionEstablished {
            connection_name: "main".into(),
        });
        sink.emit(&ConnectionEvent::CommandExecuted(CommandExecuted {
            connection_name: "main".into(),
            command_name: "GET".into(),
            args: vec![json!("k")],
            result: Value::Null,
            elapsed_time_nanos: 10,
        }));

        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.commands()[0].command_name, "GET");
        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_tracing_sink_logs_command() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let sink = TracingSink;
        sink.emit(&ConnectionEvent::CommandExecuted(CommandExecuted {
            connection_name: "main".into(),
            command_name: "MGET".into(),
            args: vec![json!("a"), json!("b")],
            result: json!([null, "1"]),
            elapsed_time_nanos: 42,
        }));
    }

    #[test]
    fn test_event_serialization() {
        let event = ConnectionEvent::ConnectionEstablished {
            connection_name: "main".into(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "event": "connection_established", "connection_name": "main" })
        );
    }
}

//! Connection facade
//!
//! The public face of one logical connection. Every command-shaped call is
//! timed and reported to the event sink once it succeeds; connect,
//! disconnect and reconnect are passed straight to the adapter.
//!
//! The typed command methods live in one file per family.

mod hashes;
mod keys;
mod lists;
mod scripts;
mod server;
mod sets;
mod streams;
mod strings;

pub use keys::Expiry;
pub use streams::StreamEntry;

use crate::adapter::{Adapter, Execution, Scan, Topology};
use crate::command::{Command, CommandName, IntoArg};
use crate::config::{ConnectionConfig, SerializationMode};
use crate::error::{ClientError, Result};
use crate::events::{args_to_json, reply_to_json, CommandExecuted, ConnectionEvent, EventSink};
use crate::protocol::RespValue;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// One named, instrumented connection
pub struct Connection {
    name: String,
    adapter: Adapter,
    sink: Arc<dyn EventSink>,
}

impl Connection {
    pub fn new(name: impl Into<String>, adapter: Adapter, sink: Arc<dyn EventSink>) -> Self {
        Connection {
            name: name.into(),
            adapter,
            sink,
        }
    }

    /// Name used in events
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ConnectionConfig {
        self.adapter.config()
    }

    /// Open the connection if needed
    ///
    /// Reports `ConnectionEstablished` when this call opened it.
    pub fn connect(&mut self) -> Result<()> {
        if self.adapter.connect()? {
            self.sink.emit(&ConnectionEvent::ConnectionEstablished {
                connection_name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Close the connection; false if it was not open
    pub fn disconnect(&mut self) -> bool {
        self.adapter.disconnect()
    }

    pub fn reconnect(&mut self) -> Result<&mut Self> {
        self.adapter.disconnect();
        self.connect()?;
        Ok(self)
    }

    pub fn is_connected(&self) -> bool {
        self.adapter.is_connected()
    }

    /// Run a catalog command: arity-checked, keys prefixed
    pub fn execute(&mut self, command: Command) -> Result<RespValue> {
        self.run(&command, Execution::Validated)
    }

    /// Run a command with its arguments sent verbatim
    pub fn execute_raw(&mut self, command: Command) -> Result<RespValue> {
        self.run(&command, Execution::Raw)
    }

    fn run(&mut self, command: &Command, mode: Execution) -> Result<RespValue> {
        self.connect()?;
        let started = Instant::now();
        let reply = self.adapter.execute(command, mode)?;
        self.report(
            command.name().as_str(),
            args_to_json(command.arguments()),
            reply_to_json(&reply),
            started,
        );
        Ok(reply)
    }

    /// Run `command` on every node and report a single event
    fn run_on_each_node(&mut self, command: &Command) -> Result<Vec<RespValue>> {
        self.connect()?;
        let started = Instant::now();
        let replies = self.adapter.execute_on_each_node(command, Execution::Validated)?;
        let result = Value::Array(replies.iter().map(reply_to_json).collect());
        self.report(command.name().as_str(), args_to_json(command.arguments()), result, started);
        Ok(replies)
    }

    fn report(&self, command_name: &str, args: Vec<Value>, result: Value, started: Instant) {
        let event = CommandExecuted {
            connection_name: self.name.clone(),
            command_name: command_name.to_string(),
            args,
            result,
            elapsed_time_nanos: elapsed_nanos(started),
        };
        self.sink.emit(&ConnectionEvent::CommandExecuted(event));
    }

    /// Keys matching `pattern`, relative to the key prefix
    ///
    /// The event for the scan is reported once the sequence is exhausted
    /// or dropped, with the number of keys it produced.
    pub fn scan(
        &mut self,
        pattern: Option<&str>,
        count: Option<usize>,
        include_prefix: bool,
    ) -> Result<KeyScan<'_>> {
        self.connect()?;
        let report = ScanReport {
            sink: self.sink.clone(),
            connection_name: self.name.clone(),
            args: vec![json!(pattern), json!(count), json!(include_prefix)],
            started: Instant::now(),
            produced: 0,
            done: false,
        };
        let inner = self.adapter.scan(pattern, count, include_prefix)?;
        Ok(KeyScan { inner, report })
    }

    /// Delete every key under the prefix, `batch_size` keys at a time
    ///
    /// Returns the number of keys deleted.
    pub fn flush_keys(&mut self, batch_size: usize) -> Result<u64> {
        let batch_size = batch_size.max(1);
        let mut total = 0u64;
        loop {
            let keys = self
                .scan(None, Some(batch_size), false)?
                .take(batch_size)
                .collect::<Result<Vec<Bytes>>>()?;
            if keys.is_empty() {
                return Ok(total);
            }

            // Multi-key DEL may span slots on a cluster
            if *self.adapter.topology() == Topology::Cluster {
                for key in keys {
                    total += self.del([key])? as u64;
                }
            } else {
                total += self.del(keys)? as u64;
            }
        }
    }

    /// Store `value` encoded with the configured serialization
    pub fn set_value<T: Serialize>(&mut self, key: impl IntoArg, value: &T) -> Result<()> {
        self.require_serialization()?;
        let encoded = serde_json::to_vec(value)
            .map_err(|e| ClientError::command(format!("Cannot encode value: {}", e)))?;
        self.set(key, encoded)
    }

    /// Read and decode a value stored by [`set_value`](Self::set_value)
    pub fn get_value<T: DeserializeOwned>(&mut self, key: impl IntoArg) -> Result<Option<T>> {
        self.require_serialization()?;
        match self.get(key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| ClientError::command(format!("Cannot decode value: {}", e))),
            None => Ok(None),
        }
    }

    fn require_serialization(&self) -> Result<()> {
        match self.config().serialization {
            SerializationMode::Json => Ok(()),
            SerializationMode::None => Err(ClientError::configuration(
                "No serialization is configured for this connection",
            )),
        }
    }

    /// Key as the caller sees it, the prefix removed
    fn strip_prefix(&self, key: Bytes) -> Bytes {
        let prefix = self.adapter.prefix();
        if !prefix.is_empty() && key.starts_with(prefix) {
            key.slice(prefix.len()..)
        } else {
            key
        }
    }
}

fn elapsed_nanos(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

struct ScanReport {
    sink: Arc<dyn EventSink>,
    connection_name: String,
    args: Vec<Value>,
    started: Instant,
    produced: usize,
    done: bool,
}

impl ScanReport {
    fn finish(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        let event = CommandExecuted {
            connection_name: self.connection_name.clone(),
            command_name: CommandName::Scan.as_str().to_string(),
            args: std::mem::take(&mut self.args),
            result: json!(self.produced),
            elapsed_time_nanos: elapsed_nanos(self.started),
        };
        self.sink.emit(&ConnectionEvent::CommandExecuted(event));
    }
}

/// Instrumented key scan, see [`Connection::scan`]
///
/// A failed scan reports nothing.
pub struct KeyScan<'a> {
    inner: Scan<'a>,
    report: ScanReport,
}

impl<'a> KeyScan<'a> {
    /// Next raw batch, see [`Scan::next_batch`]
    pub fn next_batch(&mut self) -> Option<Result<Vec<Bytes>>> {
        let batch = self.inner.next_batch();
        match &batch {
            Some(Ok(keys)) => self.report.produced += keys.len(),
            Some(Err(_)) => self.report.done = true,
            None => self.report.finish(),
        }
        batch
    }
}

impl<'a> Iterator for KeyScan<'a> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.inner.next();
        match &next {
            Some(Ok(_)) => self.report.produced += 1,
            Some(Err(_)) => self.report.done = true,
            None => self.report.finish(),
        }
        next
    }
}

impl<'a> Drop for KeyScan<'a> {
    fn drop(&mut self) {
        self.report.finish();
    }
}

/// Reply decoding shared by the command families
pub(crate) mod decode {
    use crate::error::{ClientError, Result};
    use crate::protocol::RespValue;
    use bytes::Bytes;

    pub fn unexpected(reply: &RespValue) -> ClientError {
        ClientError::command(format!("Unexpected reply: {}", reply))
    }

    pub fn integer(reply: RespValue) -> Result<i64> {
        reply.as_integer().ok_or_else(|| unexpected(&reply))
    }

    /// Integer replies used as booleans (1 / 0)
    pub fn flag(reply: RespValue) -> Result<bool> {
        Ok(integer(reply)? != 0)
    }

    pub fn optional_bytes(reply: RespValue) -> Result<Option<Bytes>> {
        match reply {
            RespValue::Null => Ok(None),
            other => bytes(other).map(Some),
        }
    }

    pub fn bytes(reply: RespValue) -> Result<Bytes> {
        match reply {
            RespValue::BulkString(bytes) => Ok(bytes),
            RespValue::SimpleString(s) => Ok(Bytes::from(s)),
            other => Err(unexpected(&other)),
        }
    }

    pub fn text(reply: RespValue) -> Result<String> {
        let bytes = bytes(reply)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn array(reply: RespValue) -> Result<Vec<RespValue>> {
        match reply {
            RespValue::Array(items) => Ok(items),
            RespValue::Null => Ok(Vec::new()),
            other => Err(unexpected(&other)),
        }
    }

    pub fn bytes_list(reply: RespValue) -> Result<Vec<Bytes>> {
        array(reply)?.into_iter().map(bytes).collect()
    }

    /// Flat `[field, value, ...]` arrays and RESP3 maps
    pub fn pairs(reply: RespValue) -> Result<Vec<(Bytes, Bytes)>> {
        match reply {
            RespValue::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((bytes(k)?, bytes(v)?)))
                .collect(),
            other => {
                let items = array(other)?;
                if items.len() % 2 != 0 {
                    return Err(ClientError::command("Unexpected reply: odd number of elements"));
                }
                let mut pairs = Vec::with_capacity(items.len() / 2);
                let mut items = items.into_iter();
                while let (Some(k), Some(v)) = (items.next(), items.next()) {
                    pairs.push((bytes(k)?, bytes(v)?));
                }
                Ok(pairs)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::events::RecordingSink;
    use crate::native::MemoryConnector;

    /// A memory-backed connection named `test` plus its event recorder
    pub fn connection(config: ConnectionConfig) -> (Connection, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let adapter = Adapter::new(config, Arc::new(MemoryConnector::new()));
        (Connection::new("test", adapter, sink.clone()), sink)
    }

    pub fn memory(config: ConnectionConfig) -> Connection {
        connection(config).0
    }
}

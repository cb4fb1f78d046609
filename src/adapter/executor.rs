//! Command executor
//!
//! Sends one command through the command handle and turns the handle's
//! last-error flag into a command error, even when the native call itself
//! reported success.

use super::Adapter;
use crate::command::Command;
use crate::error::{translate, ClientError, ErrorKind, NativeError, Result};
use crate::native::NativeHandle;
use crate::protocol::RespValue;
use bytes::Bytes;
use tracing::{debug, warn};

/// How a command goes out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Arity-checked, keys prefixed
    Validated,
    /// Arguments sent verbatim
    Raw,
}

impl Adapter {
    /// Run `command` on the command handle, connecting first if needed
    pub fn execute(&mut self, command: &Command, mode: Execution) -> Result<RespValue> {
        let args = self.wire_args(command, mode)?;
        let handle = self.command_handle()?;
        send(handle, command.name().as_str(), &args)
    }

    /// Run `command` once per node handle (once on a single node)
    pub fn execute_on_each_node(&mut self, command: &Command, mode: Execution) -> Result<Vec<RespValue>> {
        let args = self.wire_args(command, mode)?;
        self.connect()?;
        let handles = self.handles.as_mut().ok_or_else(not_connected)?;

        let mut replies = Vec::with_capacity(handles.node_count());
        for index in 0..handles.node_count() {
            let handle = handles.node(index).ok_or_else(not_connected)?;
            replies.push(send(handle, command.name().as_str(), &args)?);
        }
        Ok(replies)
    }

    fn wire_args(&self, command: &Command, mode: Execution) -> Result<Vec<Bytes>> {
        match mode {
            Execution::Validated => {
                command.validate()?;
                Ok(command.prefixed_args(self.prefix()))
            }
            Execution::Raw => Ok(command.arguments().to_vec()),
        }
    }

    fn command_handle(&mut self) -> Result<&mut (dyn NativeHandle + 'static)> {
        self.connect()?;
        let handles = self.handles.as_mut().ok_or_else(not_connected)?;
        Ok(handles.command.as_mut())
    }
}

fn not_connected() -> ClientError {
    ClientError::connection("Not connected")
}

/// Send one command and check the last-error flag
pub(crate) fn send(handle: &mut dyn NativeHandle, name: &str, args: &[Bytes]) -> Result<RespValue> {
    debug!("Executing {} ({} args)", name, args.len());

    let reply = handle.call(name, args).map_err(|err| {
        warn!("{} failed: {}", name, err);
        translate(ErrorKind::Command, err)
    })?;

    if let Some(message) = handle.last_error().map(str::to_string) {
        handle.clear_last_error();
        warn!("{} failed: {}", name, message);
        return Err(translate(ErrorKind::Command, NativeError::new(message)));
    }
    Ok(reply)
}

//! Stream commands

use super::decode::{array, bytes, integer, pairs};
use super::Connection;
use crate::command::{Command, CommandName, IntoArg};
use crate::error::{ClientError, Result};
use crate::protocol::RespValue;
use bytes::Bytes;

/// One stream entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: Bytes,
    pub fields: Vec<(Bytes, Bytes)>,
}

impl Connection {
    /// Append an entry; `id` is usually `*`. Returns the entry id.
    pub fn xadd<I, F, V>(&mut self, key: impl IntoArg, id: impl IntoArg, fields: I) -> Result<Bytes>
    where
        I: IntoIterator<Item = (F, V)>,
        F: IntoArg,
        V: IntoArg,
    {
        let command = fields
            .into_iter()
            .fold(Command::new(CommandName::XAdd).arg(key).arg(id), |command, (field, value)| {
                command.arg(field).arg(value)
            });
        bytes(self.execute(command)?)
    }

    pub fn xlen(&mut self, key: impl IntoArg) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::XLen).arg(key))?)
    }

    /// Entries between `start` and `end` (`-` and `+` for the extremes)
    pub fn xrange(
        &mut self,
        key: impl IntoArg,
        start: impl IntoArg,
        end: impl IntoArg,
        count: Option<usize>,
    ) -> Result<Vec<StreamEntry>> {
        let mut command = Command::new(CommandName::XRange).arg(key).arg(start).arg(end);
        if let Some(count) = count {
            command = command.arg("COUNT").arg(count);
        }
        entries(self.execute(command)?)
    }

    pub fn xdel<I, T>(&mut self, key: impl IntoArg, ids: I) -> Result<i64>
    where
        I: IntoIterator<Item = T>,
        T: IntoArg,
    {
        integer(self.execute(Command::new(CommandName::XDel).arg(key).args(ids))?)
    }

    /// Trim to at most `max_len` entries; returns the number removed
    pub fn xtrim(&mut self, key: impl IntoArg, max_len: usize) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::XTrim).arg(key).arg("MAXLEN").arg(max_len))?)
    }
}

/// `[[id, [field, value, ...]], ...]`
fn entries(reply: RespValue) -> Result<Vec<StreamEntry>> {
    array(reply)?
        .into_iter()
        .map(|entry| {
            let mut parts = array(entry)?.into_iter();
            match (parts.next(), parts.next()) {
                (Some(id), Some(fields)) => Ok(StreamEntry {
                    id: bytes(id)?,
                    fields: pairs(fields)?,
                }),
                _ => Err(ClientError::command("Unexpected reply: malformed stream entry")),
            }
        })
        .collect()
}

//! Hash commands

use super::decode::{flag, integer, optional_bytes, pairs};
use super::Connection;
use crate::command::{Command, CommandName, IntoArg};
use crate::error::Result;
use bytes::Bytes;

impl Connection {
    /// True when `field` is new
    pub fn hset(&mut self, key: impl IntoArg, field: impl IntoArg, value: impl IntoArg) -> Result<bool> {
        flag(self.execute(Command::new(CommandName::HSet).arg(key).arg(field).arg(value))?)
    }

    /// Number of new fields
    pub fn hset_multiple<I, F, V>(&mut self, key: impl IntoArg, fields: I) -> Result<i64>
    where
        I: IntoIterator<Item = (F, V)>,
        F: IntoArg,
        V: IntoArg,
    {
        let command = fields
            .into_iter()
            .fold(Command::new(CommandName::HSet).arg(key), |command, (field, value)| {
                command.arg(field).arg(value)
            });
        integer(self.execute(command)?)
    }

    pub fn hget(&mut self, key: impl IntoArg, field: impl IntoArg) -> Result<Option<Bytes>> {
        optional_bytes(self.execute(Command::new(CommandName::HGet).arg(key).arg(field))?)
    }

    /// Field/value pairs in reply order
    pub fn hgetall(&mut self, key: impl IntoArg) -> Result<Vec<(Bytes, Bytes)>> {
        pairs(self.execute(Command::new(CommandName::HGetAll).arg(key))?)
    }

    pub fn hdel<I, F>(&mut self, key: impl IntoArg, fields: I) -> Result<i64>
    where
        I: IntoIterator<Item = F>,
        F: IntoArg,
    {
        integer(self.execute(Command::new(CommandName::HDel).arg(key).args(fields))?)
    }

    pub fn hlen(&mut self, key: impl IntoArg) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::HLen).arg(key))?)
    }
}

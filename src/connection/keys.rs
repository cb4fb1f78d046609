//! Generic key commands

use super::decode::{flag, integer, text};
use super::Connection;
use crate::command::{Command, CommandName, IntoArg};
use crate::error::Result;

/// Decoded TTL-family reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The key does not exist
    Missing,
    /// The key exists without an expiration
    NoExpiry,
    /// Remaining time or absolute expiration, in the command's unit
    Set(i64),
}

impl From<i64> for Expiry {
    fn from(reply: i64) -> Self {
        match reply {
            -2 => Expiry::Missing,
            -1 => Expiry::NoExpiry,
            value => Expiry::Set(value),
        }
    }
}

impl Expiry {
    pub fn value(self) -> Option<i64> {
        match self {
            Expiry::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl Connection {
    /// Number of keys removed
    pub fn del<I, K>(&mut self, keys: I) -> Result<i64>
    where
        I: IntoIterator<Item = K>,
        K: IntoArg,
    {
        self.multi_key(CommandName::Del, keys)
    }

    pub fn unlink<I, K>(&mut self, keys: I) -> Result<i64>
    where
        I: IntoIterator<Item = K>,
        K: IntoArg,
    {
        self.multi_key(CommandName::Unlink, keys)
    }

    /// Number of the given keys that exist; 0 without I/O for no keys
    pub fn exists<I, K>(&mut self, keys: I) -> Result<i64>
    where
        I: IntoIterator<Item = K>,
        K: IntoArg,
    {
        self.multi_key(CommandName::Exists, keys)
    }

    fn multi_key<I, K>(&mut self, name: CommandName, keys: I) -> Result<i64>
    where
        I: IntoIterator<Item = K>,
        K: IntoArg,
    {
        let command = Command::new(name).args(keys);
        if command.arguments().is_empty() {
            return Ok(0);
        }
        integer(self.execute(command)?)
    }

    /// Set a timeout in seconds; false if the key does not exist
    pub fn expire(&mut self, key: impl IntoArg, seconds: i64) -> Result<bool> {
        flag(self.execute(Command::new(CommandName::Expire).arg(key).arg(seconds))?)
    }

    pub fn pexpire(&mut self, key: impl IntoArg, millis: i64) -> Result<bool> {
        flag(self.execute(Command::new(CommandName::PExpire).arg(key).arg(millis))?)
    }

    /// Expire at a unix time in seconds
    pub fn expire_at(&mut self, key: impl IntoArg, timestamp: i64) -> Result<bool> {
        flag(self.execute(Command::new(CommandName::ExpireAt).arg(key).arg(timestamp))?)
    }

    pub fn pexpire_at(&mut self, key: impl IntoArg, timestamp_ms: i64) -> Result<bool> {
        flag(self.execute(Command::new(CommandName::PExpireAt).arg(key).arg(timestamp_ms))?)
    }

    /// Remove the timeout; false if there was none
    pub fn persist(&mut self, key: impl IntoArg) -> Result<bool> {
        flag(self.execute(Command::new(CommandName::Persist).arg(key))?)
    }

    pub fn ttl(&mut self, key: impl IntoArg) -> Result<Expiry> {
        self.expiry(CommandName::Ttl, key)
    }

    pub fn pttl(&mut self, key: impl IntoArg) -> Result<Expiry> {
        self.expiry(CommandName::PTtl, key)
    }

    pub fn expire_time(&mut self, key: impl IntoArg) -> Result<Expiry> {
        self.expiry(CommandName::ExpireTime, key)
    }

    pub fn pexpire_time(&mut self, key: impl IntoArg) -> Result<Expiry> {
        self.expiry(CommandName::PExpireTime, key)
    }

    fn expiry(&mut self, name: CommandName, key: impl IntoArg) -> Result<Expiry> {
        integer(self.execute(Command::new(name).arg(key))?).map(Expiry::from)
    }

    /// Fails with a command error when `from` does not exist
    pub fn rename(&mut self, from: impl IntoArg, to: impl IntoArg) -> Result<()> {
        self.execute(Command::new(CommandName::Rename).arg(from).arg(to))?;
        Ok(())
    }

    /// False when `to` already exists
    pub fn renamenx(&mut self, from: impl IntoArg, to: impl IntoArg) -> Result<bool> {
        flag(self.execute(Command::new(CommandName::RenameNx).arg(from).arg(to))?)
    }

    /// `string`, `list`, `hash`, `set`, ... or `none`
    pub fn key_type(&mut self, key: impl IntoArg) -> Result<String> {
        text(self.execute(Command::new(CommandName::Type).arg(key))?)
    }
}

//! Connection, client and server commands

use super::decode::{bytes, integer, optional_bytes, text};
use super::Connection;
use crate::command::{Command, CommandName, IntoArg};
use crate::error::Result;
use bytes::Bytes;

impl Connection {
    /// `PONG`
    pub fn ping(&mut self) -> Result<String> {
        text(self.execute(Command::new(CommandName::Ping))?)
    }

    pub fn echo(&mut self, message: impl IntoArg) -> Result<Bytes> {
        bytes(self.execute(Command::new(CommandName::Echo).arg(message))?)
    }

    pub fn client_id(&mut self) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::Client).arg("ID"))?)
    }

    /// This client's line of CLIENT LIST
    pub fn client_info(&mut self) -> Result<String> {
        text(self.execute(Command::new(CommandName::Client).arg("INFO"))?)
    }

    pub fn client_list(&mut self) -> Result<String> {
        text(self.execute(Command::new(CommandName::Client).arg("LIST"))?)
    }

    /// Number of clients killed
    pub fn client_kill(&mut self, id: i64) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::Client).arg("KILL").arg("ID").arg(id))?)
    }

    pub fn client_getname(&mut self) -> Result<Option<String>> {
        let name = optional_bytes(self.execute(Command::new(CommandName::Client).arg("GETNAME"))?)?;
        Ok(name.map(|name| String::from_utf8_lossy(&name).into_owned()))
    }

    pub fn client_setname(&mut self, name: impl IntoArg) -> Result<()> {
        self.execute(Command::new(CommandName::Client).arg("SETNAME").arg(name))?;
        Ok(())
    }

    /// Keys in the selected database, summed over every node
    pub fn dbsize(&mut self) -> Result<i64> {
        let replies = self.run_on_each_node(&Command::new(CommandName::DbSize))?;
        replies.into_iter().map(integer).sum()
    }

    /// Raw INFO text, optionally limited to `section`
    pub fn info(&mut self, section: Option<&str>) -> Result<String> {
        let command = match section {
            Some(section) => Command::new(CommandName::Info).arg(section),
            None => Command::new(CommandName::Info),
        };
        text(self.execute(command)?)
    }

    /// Remove every key of the selected database on every node
    ///
    /// Unlike [`flush_keys`](Self::flush_keys) this ignores the key prefix.
    pub fn flushdb(&mut self) -> Result<()> {
        self.run_on_each_node(&Command::new(CommandName::FlushDb))?;
        Ok(())
    }
}

//! Set commands

use super::decode::{bytes_list, flag, integer};
use super::Connection;
use crate::command::{Command, CommandName, IntoArg};
use crate::error::Result;
use bytes::Bytes;

impl Connection {
    /// Number of members added
    pub fn sadd<I, M>(&mut self, key: impl IntoArg, members: I) -> Result<i64>
    where
        I: IntoIterator<Item = M>,
        M: IntoArg,
    {
        integer(self.execute(Command::new(CommandName::SAdd).arg(key).args(members))?)
    }

    pub fn srem<I, M>(&mut self, key: impl IntoArg, members: I) -> Result<i64>
    where
        I: IntoIterator<Item = M>,
        M: IntoArg,
    {
        integer(self.execute(Command::new(CommandName::SRem).arg(key).args(members))?)
    }

    /// Members in no particular order
    pub fn smembers(&mut self, key: impl IntoArg) -> Result<Vec<Bytes>> {
        bytes_list(self.execute(Command::new(CommandName::SMembers).arg(key))?)
    }

    pub fn scard(&mut self, key: impl IntoArg) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::SCard).arg(key))?)
    }

    pub fn sismember(&mut self, key: impl IntoArg, member: impl IntoArg) -> Result<bool> {
        flag(self.execute(Command::new(CommandName::SIsMember).arg(key).arg(member))?)
    }
}

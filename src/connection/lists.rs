//! List commands

use super::decode::{array, bytes, bytes_list, integer, optional_bytes};
use super::Connection;
use crate::command::{Command, CommandName, IntoArg};
use crate::error::{ClientError, Result};
use bytes::Bytes;

impl Connection {
    /// Length of the list after the push
    pub fn lpush<I, V>(&mut self, key: impl IntoArg, values: I) -> Result<i64>
    where
        I: IntoIterator<Item = V>,
        V: IntoArg,
    {
        integer(self.execute(Command::new(CommandName::LPush).arg(key).args(values))?)
    }

    pub fn rpush<I, V>(&mut self, key: impl IntoArg, values: I) -> Result<i64>
    where
        I: IntoIterator<Item = V>,
        V: IntoArg,
    {
        integer(self.execute(Command::new(CommandName::RPush).arg(key).args(values))?)
    }

    pub fn lpop(&mut self, key: impl IntoArg) -> Result<Option<Bytes>> {
        optional_bytes(self.execute(Command::new(CommandName::LPop).arg(key))?)
    }

    pub fn rpop(&mut self, key: impl IntoArg) -> Result<Option<Bytes>> {
        optional_bytes(self.execute(Command::new(CommandName::RPop).arg(key))?)
    }

    pub fn llen(&mut self, key: impl IntoArg) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::LLen).arg(key))?)
    }

    /// Inclusive range; negative indexes count from the tail
    pub fn lrange(&mut self, key: impl IntoArg, start: i64, stop: i64) -> Result<Vec<Bytes>> {
        bytes_list(self.execute(Command::new(CommandName::LRange).arg(key).arg(start).arg(stop))?)
    }

    /// Pop from the head of the first non-empty list
    ///
    /// Returns the list's key (without prefix) and the value, or None when
    /// `timeout` seconds pass first. A timeout of 0 blocks indefinitely.
    pub fn blpop<I, K>(&mut self, keys: I, timeout: f64) -> Result<Option<(Bytes, Bytes)>>
    where
        I: IntoIterator<Item = K>,
        K: IntoArg,
    {
        self.blocking_pop(CommandName::BLPop, keys, timeout)
    }

    pub fn brpop<I, K>(&mut self, keys: I, timeout: f64) -> Result<Option<(Bytes, Bytes)>>
    where
        I: IntoIterator<Item = K>,
        K: IntoArg,
    {
        self.blocking_pop(CommandName::BRPop, keys, timeout)
    }

    fn blocking_pop<I, K>(&mut self, name: CommandName, keys: I, timeout: f64) -> Result<Option<(Bytes, Bytes)>>
    where
        I: IntoIterator<Item = K>,
        K: IntoArg,
    {
        let reply = self.execute(Command::new(name).args(keys).arg(timeout))?;
        if reply.is_null() {
            return Ok(None);
        }
        let mut items = array(reply)?.into_iter();
        match (items.next(), items.next(), items.next()) {
            (Some(key), Some(value), None) => Ok(Some((self.strip_prefix(bytes(key)?), bytes(value)?))),
            _ => Err(ClientError::command("Unexpected reply: expected [key, value]")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::memory;
    use super::*;
    use crate::config::ConnectionConfig;

    #[test]
    fn test_push_pop() {
        let mut conn = memory(ConnectionConfig::memory("n1"));
        assert_eq!(conn.rpush("q", ["a", "b"]).unwrap(), 2);
        assert_eq!(conn.lpush("q", ["z"]).unwrap(), 3);
        assert_eq!(conn.llen("q").unwrap(), 3);
        assert_eq!(
            conn.lrange("q", 0, -1).unwrap(),
            vec![Bytes::from("z"), Bytes::from("a"), Bytes::from("b")]
        );

        assert_eq!(conn.lpop("q").unwrap(), Some(Bytes::from("z")));
        assert_eq!(conn.rpop("q").unwrap(), Some(Bytes::from("b")));
        assert_eq!(conn.rpop("q").unwrap(), Some(Bytes::from("a")));
        assert_eq!(conn.lpop("q").unwrap(), None);
        assert_eq!(conn.llen("q").unwrap(), 0);
    }

    #[test]
    fn test_blocking_pop_strips_prefix() {
        let mut conn = memory(ConnectionConfig::memory("n1").with_prefix("jobs:"));
        conn.rpush("high", ["1", "2"]).unwrap();

        let popped = conn.blpop(["low", "high"], 1.0).unwrap();
        assert_eq!(popped, Some((Bytes::from("high"), Bytes::from("1"))));
        let popped = conn.brpop(["high"], 1.0).unwrap();
        assert_eq!(popped, Some((Bytes::from("high"), Bytes::from("2"))));
        assert_eq!(conn.blpop(["high"], 0.1).unwrap(), None);
    }

    #[test]
    fn test_blocking_pop_rejects_negative_timeout() {
        let mut conn = memory(ConnectionConfig::memory("n1"));
        assert!(conn.blpop(["q"], -1.0).is_err());
    }
}

//! String commands

use super::decode::{array, integer, optional_bytes};
use super::Connection;
use crate::command::{Command, CommandName, IntoArg};
use crate::error::Result;
use bytes::Bytes;

impl Connection {
    /// None for a key that was never set
    pub fn get(&mut self, key: impl IntoArg) -> Result<Option<Bytes>> {
        optional_bytes(self.execute(Command::new(CommandName::Get).arg(key))?)
    }

    pub fn set(&mut self, key: impl IntoArg, value: impl IntoArg) -> Result<()> {
        self.execute(Command::new(CommandName::Set).arg(key).arg(value))?;
        Ok(())
    }

    /// SET with an expiration in seconds
    pub fn set_ex(&mut self, key: impl IntoArg, value: impl IntoArg, seconds: i64) -> Result<()> {
        let command = Command::new(CommandName::Set)
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(seconds);
        self.execute(command)?;
        Ok(())
    }

    /// Set only if absent; true when the value was written
    pub fn set_nx(&mut self, key: impl IntoArg, value: impl IntoArg) -> Result<bool> {
        let reply = self.execute(Command::new(CommandName::Set).arg(key).arg(value).arg("NX"))?;
        Ok(!reply.is_null())
    }

    pub fn getdel(&mut self, key: impl IntoArg) -> Result<Option<Bytes>> {
        optional_bytes(self.execute(Command::new(CommandName::GetDel).arg(key))?)
    }

    /// One entry per key, in order
    pub fn mget<I, K>(&mut self, keys: I) -> Result<Vec<Option<Bytes>>>
    where
        I: IntoIterator<Item = K>,
        K: IntoArg,
    {
        let reply = self.execute(Command::new(CommandName::MGet).args(keys))?;
        array(reply)?.into_iter().map(optional_bytes).collect()
    }

    pub fn mset<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: IntoArg,
        V: IntoArg,
    {
        let command = pairs
            .into_iter()
            .fold(Command::new(CommandName::MSet), |command, (key, value)| {
                command.arg(key).arg(value)
            });
        self.execute(command)?;
        Ok(())
    }

    pub fn incr(&mut self, key: impl IntoArg) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::Incr).arg(key))?)
    }

    pub fn incr_by(&mut self, key: impl IntoArg, delta: i64) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::IncrBy).arg(key).arg(delta))?)
    }

    pub fn decr(&mut self, key: impl IntoArg) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::Decr).arg(key))?)
    }

    pub fn decr_by(&mut self, key: impl IntoArg, delta: i64) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::DecrBy).arg(key).arg(delta))?)
    }

    /// Length after the append
    pub fn append(&mut self, key: impl IntoArg, value: impl IntoArg) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::Append).arg(key).arg(value))?)
    }

    pub fn strlen(&mut self, key: impl IntoArg) -> Result<i64> {
        integer(self.execute(Command::new(CommandName::StrLen).arg(key))?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::memory;
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::connection::Expiry;
    use crate::error::ErrorKind;

    #[test]
    fn test_set_get_roundtrip() {
        let mut conn = memory(ConnectionConfig::memory("n1").with_prefix("app:"));
        conn.set("greeting", "hello").unwrap();
        assert_eq!(conn.get("greeting").unwrap(), Some(Bytes::from("hello")));
        assert_eq!(conn.get("never-set").unwrap(), None);
    }

    #[test]
    fn test_binary_values() {
        let mut conn = memory(ConnectionConfig::memory("n1"));
        conn.set("bin", vec![0u8, 159, 146, 150]).unwrap();
        assert_eq!(conn.get("bin").unwrap().unwrap().as_ref(), &[0u8, 159, 146, 150]);
    }

    #[test]
    fn test_set_ex_and_nx() {
        let mut conn = memory(ConnectionConfig::memory("n1"));
        conn.set_ex("k", "v", 50).unwrap();
        assert_eq!(conn.ttl("k").unwrap(), Expiry::Set(50));

        assert!(!conn.set_nx("k", "other").unwrap());
        assert!(conn.set_nx("fresh", "v").unwrap());
        assert_eq!(conn.get("k").unwrap().unwrap(), "v");
    }

    #[test]
    fn test_mget_mset() {
        let mut conn = memory(ConnectionConfig::memory("n1").with_prefix("p:"));
        conn.mset([("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(
            conn.mget(["a", "missing", "b"]).unwrap(),
            vec![Some(Bytes::from("1")), None, Some(Bytes::from("2"))]
        );
    }

    #[test]
    fn test_counters() {
        let mut conn = memory(ConnectionConfig::memory("n1"));
        assert_eq!(conn.incr("n").unwrap(), 1);
        assert_eq!(conn.incr_by("n", 10).unwrap(), 11);
        assert_eq!(conn.decr("n").unwrap(), 10);
        assert_eq!(conn.decr_by("n", 4).unwrap(), 6);

        conn.set("text", "abc").unwrap();
        assert_eq!(conn.incr("text").err().unwrap().kind(), ErrorKind::Command);
    }

    #[test]
    fn test_append_strlen_getdel() {
        let mut conn = memory(ConnectionConfig::memory("n1"));
        assert_eq!(conn.append("s", "foo").unwrap(), 3);
        assert_eq!(conn.append("s", "bar").unwrap(), 6);
        assert_eq!(conn.strlen("s").unwrap(), 6);
        assert_eq!(conn.getdel("s").unwrap(), Some(Bytes::from("foobar")));
        assert_eq!(conn.getdel("s").unwrap(), None);
    }

    #[test]
    fn test_wrong_type() {
        let mut conn = memory(ConnectionConfig::memory("n1"));
        conn.lpush("list", ["x"]).unwrap();
        let err = conn.get("list").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Command);
        assert!(err.to_string().starts_with("WRONGTYPE"));
    }
}

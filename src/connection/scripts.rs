//! Lua scripting commands
//!
//! Keys go through the prefix like any other key argument; script
//! arguments are sent untouched.

use super::decode::{array, flag, text};
use super::Connection;
use crate::command::{Command, CommandName, IntoArg};
use crate::error::Result;
use crate::protocol::RespValue;

impl Connection {
    pub fn eval<K, A>(&mut self, script: &str, keys: K, args: A) -> Result<RespValue>
    where
        K: IntoIterator,
        K::Item: IntoArg,
        A: IntoIterator,
        A::Item: IntoArg,
    {
        self.run_script(CommandName::Eval, script, keys, args)
    }

    /// Run a script loaded with [`script_load`](Self::script_load)
    pub fn evalsha<K, A>(&mut self, sha: &str, keys: K, args: A) -> Result<RespValue>
    where
        K: IntoIterator,
        K::Item: IntoArg,
        A: IntoIterator,
        A::Item: IntoArg,
    {
        self.run_script(CommandName::EvalSha, sha, keys, args)
    }

    fn run_script<K, A>(&mut self, name: CommandName, body: &str, keys: K, args: A) -> Result<RespValue>
    where
        K: IntoIterator,
        K::Item: IntoArg,
        A: IntoIterator,
        A::Item: IntoArg,
    {
        let keys: Vec<_> = keys.into_iter().map(IntoArg::into_arg).collect();
        let command = Command::new(name)
            .arg(body)
            .arg(keys.len())
            .args(keys)
            .args(args);
        self.execute(command)
    }

    /// SHA1 of the loaded script
    pub fn script_load(&mut self, script: &str) -> Result<String> {
        text(self.execute(Command::new(CommandName::Script).arg("LOAD").arg(script))?)
    }

    /// One flag per sha, in order
    pub fn script_exists<I, S>(&mut self, shas: I) -> Result<Vec<bool>>
    where
        I: IntoIterator<Item = S>,
        S: IntoArg,
    {
        let reply = self.execute(Command::new(CommandName::Script).arg("EXISTS").args(shas))?;
        array(reply)?.into_iter().map(flag).collect()
    }

    pub fn script_flush(&mut self) -> Result<()> {
        self.execute(Command::new(CommandName::Script).arg("FLUSH"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::memory;
    use crate::command::{Command, CommandName};
    use crate::config::ConnectionConfig;
    use crate::error::ErrorKind;
    use bytes::Bytes;

    #[test]
    fn test_script_keys_are_prefixed() {
        let command = Command::new(CommandName::Eval)
            .arg("return KEYS[1]")
            .arg(2)
            .arg("a")
            .arg("b")
            .arg("plain");
        let args = command.prefixed_args(b"p:");
        assert_eq!(
            args,
            vec![
                Bytes::from("return KEYS[1]"),
                Bytes::from("2"),
                Bytes::from("p:a"),
                Bytes::from("p:b"),
                Bytes::from("plain"),
            ]
        );
    }

    #[test]
    fn test_scripting_unsupported_in_memory() {
        let mut conn = memory(ConnectionConfig::memory("n1"));
        let err = conn.eval("return 1", Vec::<&str>::new(), Vec::<&str>::new()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Command);
        assert_eq!(err.message(), "ERR unknown command 'eval'");
    }
}

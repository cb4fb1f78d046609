//! Command catalog
//!
//! The fixed set of store commands this client can send. Every command knows
//! its arity and which of its arguments are keys, so the executor can
//! validate it and apply the key prefix without any name-based lookup.

use crate::error::{ClientError, Result};
use bytes::{Bytes, BytesMut};
use std::fmt;
use std::str::FromStr;

/// Where the keys of a command sit in its argument list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpec {
    /// No key arguments
    None,
    /// Only the first argument
    First,
    /// Every argument
    All,
    /// Every argument except the last one (blocking pops: keys then timeout)
    AllButLast,
    /// Alternating key/value pairs, keys at even positions
    Pairs,
    /// Argument `index` holds a key count, the keys follow it
    Counted { index: usize },
}

macro_rules! command_catalog {
    ($( $variant:ident => $name:literal, $min:expr, $max:expr, $keys:expr; )*) => {
        /// A protocol command known to this client
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CommandName {
            $( $variant, )*
        }

        impl CommandName {
            /// Every command of the catalog
            pub const ALL: &'static [CommandName] = &[ $( CommandName::$variant, )* ];

            /// Protocol name, upper case
            pub fn as_str(self) -> &'static str {
                match self {
                    $( CommandName::$variant => $name, )*
                }
            }

            /// Minimum number of arguments (command name excluded)
            pub fn min_args(self) -> usize {
                match self {
                    $( CommandName::$variant => $min, )*
                }
            }

            /// Maximum number of arguments (None = unlimited)
            pub fn max_args(self) -> Option<usize> {
                match self {
                    $( CommandName::$variant => $max, )*
                }
            }

            pub fn key_spec(self) -> KeySpec {
                match self {
                    $( CommandName::$variant => $keys, )*
                }
            }
        }
    };
}

command_catalog! {
    // Connection
    Auth => "AUTH", 1, Some(2), KeySpec::None;
    Select => "SELECT", 1, Some(1), KeySpec::None;
    Ping => "PING", 0, Some(1), KeySpec::None;
    Echo => "ECHO", 1, Some(1), KeySpec::None;
    Client => "CLIENT", 1, None, KeySpec::None;

    // Generic
    Del => "DEL", 1, None, KeySpec::All;
    Unlink => "UNLINK", 1, None, KeySpec::All;
    Exists => "EXISTS", 1, None, KeySpec::All;
    Expire => "EXPIRE", 2, Some(3), KeySpec::First;
    ExpireAt => "EXPIREAT", 2, Some(3), KeySpec::First;
    PExpire => "PEXPIRE", 2, Some(3), KeySpec::First;
    PExpireAt => "PEXPIREAT", 2, Some(3), KeySpec::First;
    ExpireTime => "EXPIRETIME", 1, Some(1), KeySpec::First;
    PExpireTime => "PEXPIRETIME", 1, Some(1), KeySpec::First;
    Persist => "PERSIST", 1, Some(1), KeySpec::First;
    Rename => "RENAME", 2, Some(2), KeySpec::All;
    RenameNx => "RENAMENX", 2, Some(2), KeySpec::All;
    Scan => "SCAN", 1, Some(7), KeySpec::None;
    Ttl => "TTL", 1, Some(1), KeySpec::First;
    PTtl => "PTTL", 1, Some(1), KeySpec::First;
    Type => "TYPE", 1, Some(1), KeySpec::First;

    // Server
    DbSize => "DBSIZE", 0, Some(0), KeySpec::None;
    FlushDb => "FLUSHDB", 0, Some(1), KeySpec::None;
    Info => "INFO", 0, None, KeySpec::None;

    // Strings
    Get => "GET", 1, Some(1), KeySpec::First;
    Set => "SET", 2, None, KeySpec::First;
    GetDel => "GETDEL", 1, Some(1), KeySpec::First;
    MGet => "MGET", 1, None, KeySpec::All;
    MSet => "MSET", 2, None, KeySpec::Pairs;
    Incr => "INCR", 1, Some(1), KeySpec::First;
    IncrBy => "INCRBY", 2, Some(2), KeySpec::First;
    Decr => "DECR", 1, Some(1), KeySpec::First;
    DecrBy => "DECRBY", 2, Some(2), KeySpec::First;
    Append => "APPEND", 2, Some(2), KeySpec::First;
    StrLen => "STRLEN", 1, Some(1), KeySpec::First;

    // Lists
    LPush => "LPUSH", 2, None, KeySpec::First;
    RPush => "RPUSH", 2, None, KeySpec::First;
    LPop => "LPOP", 1, Some(2), KeySpec::First;
    RPop => "RPOP", 1, Some(2), KeySpec::First;
    LLen => "LLEN", 1, Some(1), KeySpec::First;
    LRange => "LRANGE", 3, Some(3), KeySpec::First;
    BLPop => "BLPOP", 2, None, KeySpec::AllButLast;
    BRPop => "BRPOP", 2, None, KeySpec::AllButLast;

    // Hashes
    HSet => "HSET", 3, None, KeySpec::First;
    HGet => "HGET", 2, Some(2), KeySpec::First;
    HGetAll => "HGETALL", 1, Some(1), KeySpec::First;
    HDel => "HDEL", 2, None, KeySpec::First;
    HLen => "HLEN", 1, Some(1), KeySpec::First;

    // Sets
    SAdd => "SADD", 2, None, KeySpec::First;
    SRem => "SREM", 2, None, KeySpec::First;
    SMembers => "SMEMBERS", 1, Some(1), KeySpec::First;
    SCard => "SCARD", 1, Some(1), KeySpec::First;
    SIsMember => "SISMEMBER", 2, Some(2), KeySpec::First;

    // Streams
    XAdd => "XADD", 4, None, KeySpec::First;
    XLen => "XLEN", 1, Some(1), KeySpec::First;
    XRange => "XRANGE", 3, Some(5), KeySpec::First;
    XDel => "XDEL", 2, None, KeySpec::First;
    XTrim => "XTRIM", 3, None, KeySpec::First;

    // Scripting
    Eval => "EVAL", 2, None, KeySpec::Counted { index: 1 };
    EvalSha => "EVALSHA", 2, None, KeySpec::Counted { index: 1 };
    Script => "SCRIPT", 1, None, KeySpec::None;
}

impl CommandName {
    /// Indexes of the key arguments within `args`
    pub fn key_positions(self, args: &[Bytes]) -> Vec<usize> {
        match self.key_spec() {
            KeySpec::None => Vec::new(),
            KeySpec::First => (0..args.len().min(1)).collect(),
            KeySpec::All => (0..args.len()).collect(),
            KeySpec::AllButLast => (0..args.len().saturating_sub(1)).collect(),
            KeySpec::Pairs => (0..args.len()).step_by(2).collect(),
            KeySpec::Counted { index } => {
                let count = args
                    .get(index)
                    .and_then(|raw| std::str::from_utf8(raw).ok())
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(0);
                let start = index + 1;
                (start..start.saturating_add(count).min(args.len())).collect()
            }
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = ClientError;

    /// Case-insensitive lookup in the catalog
    fn from_str(name: &str) -> Result<Self> {
        CommandName::ALL
            .iter()
            .copied()
            .find(|command| command.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ClientError::command(format!("ERR unknown command '{}'", name)))
    }
}

/// Conversion of a value into one protocol argument
pub trait IntoArg {
    fn into_arg(self) -> Bytes;
}

impl IntoArg for Bytes {
    fn into_arg(self) -> Bytes {
        self
    }
}

impl IntoArg for &Bytes {
    fn into_arg(self) -> Bytes {
        self.clone()
    }
}

impl IntoArg for &str {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl IntoArg for String {
    fn into_arg(self) -> Bytes {
        Bytes::from(self)
    }
}

impl IntoArg for &String {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl IntoArg for &[u8] {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl IntoArg for Vec<u8> {
    fn into_arg(self) -> Bytes {
        Bytes::from(self)
    }
}

macro_rules! numeric_args {
    ($($ty:ty),*) => {
        $(
            impl IntoArg for $ty {
                fn into_arg(self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )*
    };
}

numeric_args!(i32, i64, u32, u64, usize, f64);

/// One command with its positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: CommandName,
    args: Vec<Bytes>,
}

impl Command {
    pub fn new(name: CommandName) -> Self {
        Command { name, args: Vec::new() }
    }

    /// Append one argument
    pub fn arg(mut self, value: impl IntoArg) -> Self {
        self.args.push(value.into_arg());
        self
    }

    /// Append several arguments
    pub fn args<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.args.extend(values.into_iter().map(IntoArg::into_arg));
        self
    }

    pub fn name(&self) -> CommandName {
        self.name
    }

    pub fn arguments(&self) -> &[Bytes] {
        &self.args
    }

    /// The key arguments, unprefixed
    pub fn keys(&self) -> Vec<&Bytes> {
        self.name
            .key_positions(&self.args)
            .into_iter()
            .map(|i| &self.args[i])
            .collect()
    }

    /// Arity check against the catalog
    pub fn validate(&self) -> Result<()> {
        let count = self.args.len();
        let too_few = count < self.name.min_args();
        let too_many = self.name.max_args().map_or(false, |max| count > max);
        if too_few || too_many || !self.pairs_balanced() {
            return Err(ClientError::command(format!(
                "ERR wrong number of arguments for '{}' command",
                self.name.as_str().to_lowercase()
            )));
        }
        Ok(())
    }

    fn pairs_balanced(&self) -> bool {
        match self.name.key_spec() {
            KeySpec::Pairs => self.args.len() % 2 == 0,
            _ => true,
        }
    }

    /// Arguments with `prefix` prepended to every key
    pub fn prefixed_args(&self, prefix: &[u8]) -> Vec<Bytes> {
        if prefix.is_empty() {
            return self.args.clone();
        }
        let mut args = self.args.clone();
        for i in self.name.key_positions(&self.args) {
            let mut key = BytesMut::with_capacity(prefix.len() + args[i].len());
            key.extend_from_slice(prefix);
            key.extend_from_slice(&args[i]);
            args[i] = key.freeze();
        }
        args
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}

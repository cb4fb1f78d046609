//! Command execution for the in-memory store
//!
//! One file per command family. Every command is a plain function from the
//! execution context and its arguments to a reply; store-level failures are
//! error replies, exactly as a server would send them.

mod connection;
mod hash;
mod key;
mod list;
mod scan;
mod server;
mod set;
mod string;
mod ttl;

use super::node::{MemoryNode, Session};
use super::store::Keyspace;
use crate::command::CommandName;
use crate::protocol::RespValue;
use bytes::Bytes;

/// Outcome of a command; `Err` holds an error reply
pub(crate) type Reply = Result<RespValue, RespValue>;

pub(crate) const WRONG_TYPE: &str =
    "WRONGTYPE Operation against a key holding the wrong kind of value";

/// Context provided to commands during execution
pub struct CommandContext<'a> {
    pub node: &'a mut MemoryNode,
    pub session: &'a mut Session,
}

impl<'a> CommandContext<'a> {
    pub fn new(node: &'a mut MemoryNode, session: &'a mut Session) -> Self {
        CommandContext { node, session }
    }

    /// The database selected by this session
    pub fn store(&mut self) -> &mut Keyspace {
        let db = self.session.db;
        self.node.database(db)
    }
}

/// Execute one command
pub fn dispatch(ctx: &mut CommandContext<'_>, name: CommandName, args: &[Bytes]) -> RespValue {
    let too_many = name.max_args().map_or(false, |max| args.len() > max);
    if args.len() < name.min_args() || too_many {
        return RespValue::error(format!(
            "ERR wrong number of arguments for '{}' command",
            name.as_str().to_lowercase()
        ));
    }

    if !ctx.session.authenticated && name != CommandName::Auth {
        return RespValue::error("NOAUTH Authentication required.");
    }

    let session_id = ctx.session.id;
    if let Some(client) = ctx.node.client_mut(session_id) {
        client.last_command = name.as_str();
    }

    let reply = match name {
        CommandName::Auth => connection::auth(ctx, args),
        CommandName::Select => connection::select(ctx, args),
        CommandName::Ping => connection::ping(args),
        CommandName::Echo => Ok(RespValue::BulkString(args[0].clone())),
        CommandName::Client => connection::client(ctx, args),

        CommandName::Del | CommandName::Unlink => key::del(ctx, args),
        CommandName::Exists => key::exists(ctx, args),
        CommandName::Rename => key::rename(ctx, args, false),
        CommandName::RenameNx => key::rename(ctx, args, true),
        CommandName::Type => key::type_of(ctx, args),
        CommandName::Scan => scan::scan(ctx, args),

        CommandName::Expire => ttl::expire(ctx, args, 1000, false),
        CommandName::PExpire => ttl::expire(ctx, args, 1, false),
        CommandName::ExpireAt => ttl::expire(ctx, args, 1000, true),
        CommandName::PExpireAt => ttl::expire(ctx, args, 1, true),
        CommandName::Ttl => ttl::ttl(ctx, args, 1000),
        CommandName::PTtl => ttl::ttl(ctx, args, 1),
        CommandName::ExpireTime => ttl::expire_time(ctx, args, 1000),
        CommandName::PExpireTime => ttl::expire_time(ctx, args, 1),
        CommandName::Persist => ttl::persist(ctx, args),

        CommandName::DbSize => server::dbsize(ctx),
        CommandName::FlushDb => server::flushdb(ctx, args),
        CommandName::Info => server::info(ctx),

        CommandName::Get => string::get(ctx, args),
        CommandName::Set => string::set(ctx, args),
        CommandName::GetDel => string::getdel(ctx, args),
        CommandName::MGet => string::mget(ctx, args),
        CommandName::MSet => string::mset(ctx, args),
        CommandName::Incr => string::incr_by(ctx, &args[0], 1),
        CommandName::Decr => string::incr_by(ctx, &args[0], -1),
        CommandName::IncrBy => parse_integer(&args[1]).and_then(|n| string::incr_by(ctx, &args[0], n)),
        CommandName::DecrBy => parse_integer(&args[1]).and_then(|n| {
            let delta = n
                .checked_neg()
                .ok_or_else(|| RespValue::error("ERR decrement would overflow"))?;
            string::incr_by(ctx, &args[0], delta)
        }),
        CommandName::Append => string::append(ctx, args),
        CommandName::StrLen => string::strlen(ctx, args),

        CommandName::LPush => list::push(ctx, args, list::End::Left),
        CommandName::RPush => list::push(ctx, args, list::End::Right),
        CommandName::LPop => list::pop(ctx, args, list::End::Left),
        CommandName::RPop => list::pop(ctx, args, list::End::Right),
        CommandName::LLen => list::llen(ctx, args),
        CommandName::LRange => list::lrange(ctx, args),
        CommandName::BLPop => list::blocking_pop(ctx, args, list::End::Left),
        CommandName::BRPop => list::blocking_pop(ctx, args, list::End::Right),

        CommandName::HSet => hash::hset(ctx, args),
        CommandName::HGet => hash::hget(ctx, args),
        CommandName::HGetAll => hash::hgetall(ctx, args),
        CommandName::HDel => hash::hdel(ctx, args),
        CommandName::HLen => hash::hlen(ctx, args),

        CommandName::SAdd => set::sadd(ctx, args),
        CommandName::SRem => set::srem(ctx, args),
        CommandName::SMembers => set::smembers(ctx, args),
        CommandName::SCard => set::scard(ctx, args),
        CommandName::SIsMember => set::sismember(ctx, args),

        // Streams and scripting are not emulated
        CommandName::XAdd
        | CommandName::XLen
        | CommandName::XRange
        | CommandName::XDel
        | CommandName::XTrim
        | CommandName::Eval
        | CommandName::EvalSha
        | CommandName::Script => Err(unknown_command(name.as_str())),
    };

    reply.unwrap_or_else(|err| err)
}

pub(crate) fn unknown_command(name: &str) -> RespValue {
    RespValue::error(format!("ERR unknown command '{}'", name.to_lowercase()))
}

pub(crate) fn syntax_error() -> RespValue {
    RespValue::error("ERR syntax error")
}

/// Parse an integer argument
pub(crate) fn parse_integer(arg: &[u8]) -> Result<i64, RespValue> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| RespValue::error("ERR value is not an integer or out of range"))
}

/// Upper-cased option keyword
pub(crate) fn keyword(arg: &[u8]) -> String {
    String::from_utf8_lossy(arg).to_uppercase()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A node with one connected session, for command tests
    pub struct Fixture {
        pub node: MemoryNode,
        pub session: Session,
    }

    impl Fixture {
        pub fn new() -> Self {
            let mut node = MemoryNode::new("test", None);
            let session = node.connect_client();
            Fixture { node, session }
        }

        pub fn run(&mut self, name: CommandName, args: &[&str]) -> RespValue {
            let args: Vec<Bytes> = args.iter().map(|a| Bytes::copy_from_slice(a.as_bytes())).collect();
            let mut ctx = CommandContext::new(&mut self.node, &mut self.session);
            dispatch(&mut ctx, name, &args)
        }
    }
}

//! String commands (GET, SET, MGET, MSET, INCR ...)

use super::{keyword, parse_integer, syntax_error, CommandContext, Reply, WRONG_TYPE};
use crate::native::memory::entry::now_ms;
use crate::native::memory::value::Value;
use crate::protocol::RespValue;
use bytes::{Bytes, BytesMut};

/// String value at `key`, None when missing
fn read_string(ctx: &mut CommandContext<'_>, key: &[u8]) -> Result<Option<Bytes>, RespValue> {
    match ctx.store().get(key) {
        Some(Value::String(bytes)) => Ok(Some(bytes.clone())),
        Some(_) => Err(RespValue::error(WRONG_TYPE)),
        None => Ok(None),
    }
}

/// GET key
pub fn get(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    Ok(read_string(ctx, &args[0])?
        .map(RespValue::BulkString)
        .unwrap_or(RespValue::Null))
}

/// GETDEL key
pub fn getdel(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let value = read_string(ctx, &args[0])?;
    if value.is_some() {
        ctx.store().delete(&args[0]);
    }
    Ok(value.map(RespValue::BulkString).unwrap_or(RespValue::Null))
}

enum Condition {
    Always,
    IfMissing,
    IfExists,
}

enum Expiry {
    Clear,
    Keep,
    At(i64),
}

/// SET key value [NX | XX] [GET] [EX s | PX ms | EXAT ts | PXAT ts | KEEPTTL]
pub fn set(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let key = &args[0];
    let value = args[1].clone();

    let mut condition = Condition::Always;
    let mut expiry = Expiry::Clear;
    let mut return_old = false;

    let mut i = 2;
    while i < args.len() {
        let option = keyword(&args[i]);
        match option.as_str() {
            "NX" => condition = Condition::IfMissing,
            "XX" => condition = Condition::IfExists,
            "GET" => return_old = true,
            "KEEPTTL" => expiry = Expiry::Keep,
            "EX" | "PX" | "EXAT" | "PXAT" => {
                let amount = args.get(i + 1).ok_or_else(syntax_error)?;
                let amount = parse_integer(amount)?;
                if amount <= 0 {
                    return Err(RespValue::error("ERR invalid expire time in 'set' command"));
                }
                let at = match option.as_str() {
                    "EX" => amount.checked_mul(1000).and_then(|ms| now_ms().checked_add(ms)),
                    "PX" => now_ms().checked_add(amount),
                    "EXAT" => amount.checked_mul(1000),
                    _ => Some(amount),
                }
                .ok_or_else(|| RespValue::error("ERR invalid expire time in 'set' command"))?;
                expiry = Expiry::At(at);
                i += 1;
            }
            _ => return Err(syntax_error()),
        }
        i += 1;
    }

    let old = if return_old {
        read_string(ctx, key)?
    } else {
        None
    };

    let exists = ctx.store().exists(key);
    let allowed = match condition {
        Condition::Always => true,
        Condition::IfMissing => !exists,
        Condition::IfExists => exists,
    };

    if allowed {
        let store = ctx.store();
        match expiry {
            Expiry::Clear => {
                store.set(key.clone(), Value::String(value));
            }
            Expiry::Keep => store.set_keep_ttl(key.clone(), Value::String(value)),
            Expiry::At(at) => {
                store.set(key.clone(), Value::String(value));
                store.expire_at(key, at);
            }
        }
    }

    if return_old {
        return Ok(old.map(RespValue::BulkString).unwrap_or(RespValue::Null));
    }
    Ok(if allowed { RespValue::ok() } else { RespValue::Null })
}

/// MGET key [key ...]; non-string values read as null
pub fn mget(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let store = ctx.store();
    let values = args
        .iter()
        .map(|key| match store.get(key) {
            Some(Value::String(bytes)) => RespValue::BulkString(bytes.clone()),
            _ => RespValue::Null,
        })
        .collect();
    Ok(RespValue::Array(values))
}

/// MSET key value [key value ...]
pub fn mset(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    if args.len() % 2 != 0 {
        return Err(RespValue::error("ERR wrong number of arguments for 'mset' command"));
    }
    let store = ctx.store();
    for pair in args.chunks(2) {
        store.set(pair[0].clone(), Value::String(pair[1].clone()));
    }
    Ok(RespValue::ok())
}

/// INCR / INCRBY / DECR / DECRBY, keeping any expiration
pub fn incr_by(ctx: &mut CommandContext<'_>, key: &Bytes, delta: i64) -> Reply {
    let current = match read_string(ctx, key)? {
        Some(bytes) => parse_integer(&bytes)?,
        None => 0,
    };
    let next = current
        .checked_add(delta)
        .ok_or_else(|| RespValue::error("ERR increment or decrement would overflow"))?;
    ctx.store()
        .set_keep_ttl(key.clone(), Value::string(next.to_string()));
    Ok(RespValue::Integer(next))
}

/// APPEND key value
pub fn append(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let key = &args[0];
    let mut buf = BytesMut::new();
    if let Some(existing) = read_string(ctx, key)? {
        buf.extend_from_slice(&existing);
    }
    buf.extend_from_slice(&args[1]);
    let len = buf.len() as i64;
    ctx.store().set_keep_ttl(key.clone(), Value::String(buf.freeze()));
    Ok(RespValue::Integer(len))
}

/// STRLEN key
pub fn strlen(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let len = read_string(ctx, &args[0])?.map(|b| b.len()).unwrap_or(0);
    Ok(RespValue::Integer(len as i64))
}

#[cfg(test)]
mod tests {
    use super::super::testing::Fixture;
    use crate::command::CommandName;
    use crate::protocol::RespValue;

    #[test]
    fn test_get_nonexistent() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(CommandName::Get, &["nonexistent"]), RespValue::Null);
    }

    #[test]
    fn test_get_wrong_type() {
        let mut fx = Fixture::new();
        fx.run(CommandName::LPush, &["list", "a"]);
        let reply = fx.run(CommandName::Get, &["list"]);
        assert!(reply.as_str().unwrap().starts_with("WRONGTYPE"));
    }

    #[test]
    fn test_set_nx_xx() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(CommandName::Set, &["k", "1", "XX"]), RespValue::Null);
        assert_eq!(fx.run(CommandName::Set, &["k", "1", "NX"]), RespValue::ok());
        assert_eq!(fx.run(CommandName::Set, &["k", "2", "NX"]), RespValue::Null);
        assert_eq!(fx.run(CommandName::Set, &["k", "3", "XX", "GET"]), RespValue::bulk_string("1"));
        assert_eq!(fx.run(CommandName::Get, &["k"]), RespValue::bulk_string("3"));
    }

    #[test]
    fn test_set_with_expiry() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(CommandName::Set, &["k", "v", "EX", "100"]), RespValue::ok());
        let ttl = fx.run(CommandName::Ttl, &["k"]).as_integer().unwrap();
        assert!(ttl > 98 && ttl <= 100);
        assert!(fx.run(CommandName::Set, &["k", "v", "EX", "0"]).is_error());
        assert!(fx.run(CommandName::Set, &["k", "v", "BOGUS"]).is_error());
    }

    #[test]
    fn test_mset_mget() {
        let mut fx = Fixture::new();
        fx.run(CommandName::MSet, &["a", "1", "b", "2"]);
        fx.run(CommandName::SAdd, &["s", "x"]);
        let reply = fx.run(CommandName::MGet, &["a", "missing", "b", "s"]);
        assert_eq!(
            reply,
            RespValue::array(vec![
                RespValue::bulk_string("1"),
                RespValue::Null,
                RespValue::bulk_string("2"),
                RespValue::Null,
            ])
        );
    }

    #[test]
    fn test_counters() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(CommandName::Incr, &["c"]), RespValue::integer(1));
        assert_eq!(fx.run(CommandName::IncrBy, &["c", "10"]), RespValue::integer(11));
        assert_eq!(fx.run(CommandName::DecrBy, &["c", "5"]), RespValue::integer(6));
        assert_eq!(fx.run(CommandName::Decr, &["c"]), RespValue::integer(5));

        fx.run(CommandName::Set, &["s", "abc"]);
        assert_eq!(
            fx.run(CommandName::Incr, &["s"]),
            RespValue::error("ERR value is not an integer or out of range")
        );
    }

    #[test]
    fn test_append_strlen_getdel() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(CommandName::Append, &["k", "Hello"]), RespValue::integer(5));
        assert_eq!(fx.run(CommandName::Append, &["k", " World"]), RespValue::integer(11));
        assert_eq!(fx.run(CommandName::StrLen, &["k"]), RespValue::integer(11));
        assert_eq!(fx.run(CommandName::GetDel, &["k"]), RespValue::bulk_string("Hello World"));
        assert_eq!(fx.run(CommandName::Get, &["k"]), RespValue::Null);
    }
}

//! Expiration commands (EXPIRE family, TTL, PTTL, EXPIRETIME, PERSIST)

use super::{keyword, parse_integer, syntax_error, CommandContext, Reply};
use crate::native::memory::entry::now_ms;
use crate::protocol::RespValue;
use bytes::Bytes;

/// EXPIRE / PEXPIRE / EXPIREAT / PEXPIREAT key amount [NX | XX | GT | LT]
///
/// `unit_ms` is the size of one unit of `amount` in milliseconds; an
/// absolute amount is a unix timestamp in those units.
pub fn expire(ctx: &mut CommandContext<'_>, args: &[Bytes], unit_ms: i64, absolute: bool) -> Reply {
    let key = &args[0];
    let amount = parse_integer(&args[1])?;

    let scaled = amount.checked_mul(unit_ms);
    let at_ms = if absolute {
        scaled
    } else {
        scaled.and_then(|ms| now_ms().checked_add(ms))
    }
    .ok_or_else(|| RespValue::error("ERR invalid expire time in 'expire' command"))?;

    let store = ctx.store();
    let current = store.expire_time_ms(key);
    if current == -2 {
        return Ok(RespValue::integer(0));
    }

    if let Some(flag) = args.get(2) {
        // A key without expiration counts as an infinite TTL
        let allowed = match keyword(flag).as_str() {
            "NX" => current == -1,
            "XX" => current != -1,
            "GT" => current != -1 && at_ms > current,
            "LT" => current == -1 || at_ms < current,
            _ => return Err(syntax_error()),
        };
        if !allowed {
            return Ok(RespValue::integer(0));
        }
    }

    Ok(RespValue::integer(store.expire_at(key, at_ms) as i64))
}

/// TTL / PTTL key; -2 for a missing key, -1 without expiration
pub fn ttl(ctx: &mut CommandContext<'_>, args: &[Bytes], unit_ms: i64) -> Reply {
    let ms = ctx.store().ttl_ms(&args[0]);
    if ms < 0 {
        return Ok(RespValue::integer(ms));
    }
    Ok(RespValue::integer((ms + unit_ms / 2) / unit_ms))
}

/// EXPIRETIME / PEXPIRETIME key; -2 for a missing key, -1 without expiration
pub fn expire_time(ctx: &mut CommandContext<'_>, args: &[Bytes], unit_ms: i64) -> Reply {
    let at = ctx.store().expire_time_ms(&args[0]);
    if at < 0 {
        return Ok(RespValue::integer(at));
    }
    Ok(RespValue::integer(at / unit_ms))
}

/// PERSIST key
pub fn persist(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    Ok(RespValue::integer(ctx.store().persist(&args[0]) as i64))
}

#[cfg(test)]
mod tests {
    use super::super::testing::Fixture;
    use crate::command::CommandName;
    use crate::native::memory::entry::now_ms;
    use crate::protocol::RespValue;

    #[test]
    fn test_expire_ttl() {
        let mut fx = Fixture::new();
        fx.run(CommandName::Set, &["key1", "value1"]);

        assert_eq!(fx.run(CommandName::Expire, &["key1", "100"]), RespValue::integer(1));

        let ttl = fx.run(CommandName::Ttl, &["key1"]).as_integer().unwrap();
        assert!(ttl >= 99 && ttl <= 100);
        let pttl = fx.run(CommandName::PTtl, &["key1"]).as_integer().unwrap();
        assert!(pttl > 99_000 && pttl <= 100_000);
    }

    #[test]
    fn test_ttl_sentinels() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(CommandName::Ttl, &["nonexistent"]), RespValue::integer(-2));
        assert_eq!(fx.run(CommandName::PExpireTime, &["nonexistent"]), RespValue::integer(-2));

        fx.run(CommandName::Set, &["key1", "value1"]);
        assert_eq!(fx.run(CommandName::Ttl, &["key1"]), RespValue::integer(-1));
        assert_eq!(fx.run(CommandName::ExpireTime, &["key1"]), RespValue::integer(-1));
    }

    #[test]
    fn test_expire_missing_key() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(CommandName::Expire, &["nope", "10"]), RespValue::integer(0));
    }

    #[test]
    fn test_expireat_and_expiretime() {
        let mut fx = Fixture::new();
        fx.run(CommandName::Set, &["k", "v"]);
        let at = now_ms() / 1000 + 500;
        assert_eq!(
            fx.run(CommandName::ExpireAt, &["k", &at.to_string()]),
            RespValue::integer(1)
        );
        assert_eq!(fx.run(CommandName::ExpireTime, &["k"]), RespValue::integer(at));
        assert_eq!(fx.run(CommandName::PExpireTime, &["k"]), RespValue::integer(at * 1000));
    }

    #[test]
    fn test_expire_flags() {
        let mut fx = Fixture::new();
        fx.run(CommandName::Set, &["k", "v"]);
        assert_eq!(fx.run(CommandName::Expire, &["k", "100", "XX"]), RespValue::integer(0));
        assert_eq!(fx.run(CommandName::Expire, &["k", "100", "NX"]), RespValue::integer(1));
        assert_eq!(fx.run(CommandName::Expire, &["k", "50", "GT"]), RespValue::integer(0));
        assert_eq!(fx.run(CommandName::Expire, &["k", "50", "LT"]), RespValue::integer(1));
        assert!(fx.run(CommandName::Expire, &["k", "50", "ZZ"]).is_error());
    }

    #[test]
    fn test_persist() {
        let mut fx = Fixture::new();
        fx.run(CommandName::Set, &["k", "v", "PX", "100000"]);
        assert_eq!(fx.run(CommandName::Persist, &["k"]), RespValue::integer(1));
        assert_eq!(fx.run(CommandName::Persist, &["k"]), RespValue::integer(0));
        assert_eq!(fx.run(CommandName::Ttl, &["k"]), RespValue::integer(-1));
    }

    #[test]
    fn test_negative_expire_deletes() {
        let mut fx = Fixture::new();
        fx.run(CommandName::Set, &["k", "v"]);
        assert_eq!(fx.run(CommandName::Expire, &["k", "-1"]), RespValue::integer(1));
        assert_eq!(fx.run(CommandName::Exists, &["k"]), RespValue::integer(0));
    }
}

//! Set commands (SADD, SREM, SMEMBERS, SCARD, SISMEMBER)

use super::{CommandContext, Reply, WRONG_TYPE};
use crate::native::memory::value::Value;
use crate::protocol::RespValue;
use bytes::Bytes;
use std::collections::HashSet;

fn read_set<'s>(
    ctx: &'s mut CommandContext<'_>,
    key: &[u8],
) -> Result<Option<&'s HashSet<Bytes>>, RespValue> {
    match ctx.store().get(key) {
        Some(value) => value
            .as_set()
            .map(Some)
            .ok_or_else(|| RespValue::error(WRONG_TYPE)),
        None => Ok(None),
    }
}

/// SADD key member [member ...]
pub fn sadd(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let set = ctx
        .store()
        .get_or_insert_with(&args[0], Value::empty_set)
        .as_set_mut()
        .ok_or_else(|| RespValue::error(WRONG_TYPE))?;
    let added = args[1..]
        .iter()
        .filter(|member| set.insert((*member).clone()))
        .count();
    Ok(RespValue::integer(added as i64))
}

/// SREM key member [member ...]
pub fn srem(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let key = &args[0];
    let store = ctx.store();
    let set = match store.get_mut(key) {
        Some(value) => value.as_set_mut().ok_or_else(|| RespValue::error(WRONG_TYPE))?,
        None => return Ok(RespValue::integer(0)),
    };
    let removed = args[1..].iter().filter(|member| set.remove(*member)).count();
    store.remove_if_empty(key);
    Ok(RespValue::integer(removed as i64))
}

/// SMEMBERS key, sorted
pub fn smembers(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let mut members: Vec<Bytes> = read_set(ctx, &args[0])?
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default();
    members.sort();
    Ok(RespValue::Array(members.into_iter().map(RespValue::BulkString).collect()))
}

/// SCARD key
pub fn scard(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let len = read_set(ctx, &args[0])?.map_or(0, HashSet::len);
    Ok(RespValue::integer(len as i64))
}

/// SISMEMBER key member
pub fn sismember(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let member = &args[1];
    let found = read_set(ctx, &args[0])?.map_or(false, |set| set.contains(member));
    Ok(RespValue::integer(found as i64))
}

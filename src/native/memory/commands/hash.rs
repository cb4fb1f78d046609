//! Hash commands (HSET, HGET, HGETALL, HDEL, HLEN)

use super::{CommandContext, Reply, WRONG_TYPE};
use crate::native::memory::value::Value;
use crate::protocol::RespValue;
use bytes::Bytes;
use std::collections::HashMap;

fn read_hash<'s>(
    ctx: &'s mut CommandContext<'_>,
    key: &[u8],
) -> Result<Option<&'s HashMap<Bytes, Bytes>>, RespValue> {
    match ctx.store().get(key) {
        Some(value) => value
            .as_hash()
            .map(Some)
            .ok_or_else(|| RespValue::error(WRONG_TYPE)),
        None => Ok(None),
    }
}

/// HSET key field value [field value ...]; returns the number of new fields
pub fn hset(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let (key, pairs) = (&args[0], &args[1..]);
    if pairs.len() % 2 != 0 {
        return Err(RespValue::error("ERR wrong number of arguments for 'hset' command"));
    }

    let hash = ctx
        .store()
        .get_or_insert_with(key, Value::empty_hash)
        .as_hash_mut()
        .ok_or_else(|| RespValue::error(WRONG_TYPE))?;

    let added = pairs
        .chunks(2)
        .filter(|pair| hash.insert(pair[0].clone(), pair[1].clone()).is_none())
        .count();
    Ok(RespValue::integer(added as i64))
}

/// HGET key field
pub fn hget(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let field = &args[1];
    Ok(read_hash(ctx, &args[0])?
        .and_then(|hash| hash.get(field))
        .map(|value| RespValue::BulkString(value.clone()))
        .unwrap_or(RespValue::Null))
}

/// HGETALL key, as a flat field/value array ordered by field
pub fn hgetall(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let mut pairs: Vec<(&Bytes, &Bytes)> = match read_hash(ctx, &args[0])? {
        Some(hash) => hash.iter().collect(),
        None => Vec::new(),
    };
    pairs.sort();

    let flat = pairs
        .into_iter()
        .flat_map(|(field, value)| {
            [
                RespValue::BulkString(field.clone()),
                RespValue::BulkString(value.clone()),
            ]
        })
        .collect();
    Ok(RespValue::Array(flat))
}

/// HDEL key field [field ...]
pub fn hdel(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let key = &args[0];
    let store = ctx.store();
    let hash = match store.get_mut(key) {
        Some(value) => value.as_hash_mut().ok_or_else(|| RespValue::error(WRONG_TYPE))?,
        None => return Ok(RespValue::integer(0)),
    };

    let removed = args[1..]
        .iter()
        .filter(|field| hash.remove(*field).is_some())
        .count();
    store.remove_if_empty(key);
    Ok(RespValue::integer(removed as i64))
}

/// HLEN key
pub fn hlen(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let len = read_hash(ctx, &args[0])?.map_or(0, HashMap::len);
    Ok(RespValue::integer(len as i64))
}

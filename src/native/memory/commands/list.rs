//! List commands (LPUSH, RPUSH, LPOP, RPOP, LLEN, LRANGE, BLPOP, BRPOP)

use super::{parse_integer, CommandContext, Reply, WRONG_TYPE};
use crate::native::memory::value::Value;
use crate::protocol::RespValue;
use bytes::Bytes;

/// Which end of the list a command works on
#[derive(Debug, Clone, Copy)]
pub enum End {
    Left,
    Right,
}

/// LPUSH / RPUSH key element [element ...]
pub fn push(ctx: &mut CommandContext<'_>, args: &[Bytes], end: End) -> Reply {
    let key = &args[0];
    let store = ctx.store();
    let list = store
        .get_or_insert_with(key, Value::empty_list)
        .as_list_mut()
        .ok_or_else(|| RespValue::error(WRONG_TYPE))?;

    for element in &args[1..] {
        match end {
            End::Left => list.push_front(element.clone()),
            End::Right => list.push_back(element.clone()),
        }
    }
    Ok(RespValue::integer(list.len() as i64))
}

/// LPOP / RPOP key [count]
pub fn pop(ctx: &mut CommandContext<'_>, args: &[Bytes], end: End) -> Reply {
    let key = &args[0];
    let count = match args.get(1) {
        Some(raw) => {
            let n = parse_integer(raw)?;
            if n < 0 {
                return Err(RespValue::error("ERR value is out of range, must be positive"));
            }
            Some(n as usize)
        }
        None => None,
    };

    let store = ctx.store();
    let list = match store.get_mut(key) {
        Some(value) => value.as_list_mut().ok_or_else(|| RespValue::error(WRONG_TYPE))?,
        None => return Ok(RespValue::Null),
    };

    let take = count.unwrap_or(1).min(list.len());
    let popped: Vec<RespValue> = (0..take)
        .filter_map(|_| match end {
            End::Left => list.pop_front(),
            End::Right => list.pop_back(),
        })
        .map(RespValue::BulkString)
        .collect();
    store.remove_if_empty(key);

    Ok(match count {
        Some(_) => RespValue::Array(popped),
        None => popped.into_iter().next().unwrap_or(RespValue::Null),
    })
}

/// LLEN key
pub fn llen(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let len = match ctx.store().get(&args[0]) {
        Some(value) => value.as_list().ok_or_else(|| RespValue::error(WRONG_TYPE))?.len(),
        None => 0,
    };
    Ok(RespValue::integer(len as i64))
}

/// LRANGE key start stop, negative indexes count from the tail
pub fn lrange(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let start = parse_integer(&args[1])?;
    let stop = parse_integer(&args[2])?;

    let list = match ctx.store().get(&args[0]) {
        Some(value) => value.as_list().ok_or_else(|| RespValue::error(WRONG_TYPE))?,
        None => return Ok(RespValue::Array(Vec::new())),
    };

    let len = list.len() as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return Ok(RespValue::Array(Vec::new()));
    }

    let items = list
        .iter()
        .skip(start as usize)
        .take((stop - start + 1) as usize)
        .cloned()
        .map(RespValue::BulkString)
        .collect();
    Ok(RespValue::Array(items))
}

/// BLPOP / BRPOP key [key ...] timeout
///
/// The in-memory store never blocks: the first non-empty list is popped,
/// otherwise the timeout is considered elapsed and null is returned.
pub fn blocking_pop(ctx: &mut CommandContext<'_>, args: &[Bytes], end: End) -> Reply {
    let (keys, timeout) = args.split_at(args.len() - 1);
    let valid_timeout = std::str::from_utf8(&timeout[0])
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .map_or(false, |t| t >= 0.0);
    if !valid_timeout {
        return Err(RespValue::error("ERR timeout is not a float or out of range"));
    }

    for key in keys {
        let reply = pop(ctx, std::slice::from_ref(key), end)?;
        if let RespValue::BulkString(element) = reply {
            return Ok(RespValue::Array(vec![
                RespValue::BulkString(key.clone()),
                RespValue::BulkString(element),
            ]));
        }
    }
    Ok(RespValue::Null)
}

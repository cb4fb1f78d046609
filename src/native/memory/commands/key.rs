//! Key commands (DEL, EXISTS, RENAME, TYPE)

use super::{CommandContext, Reply};
use crate::protocol::RespValue;
use bytes::Bytes;

/// DEL / UNLINK key [key ...]
pub fn del(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let store = ctx.store();
    let deleted = args.iter().filter(|key| store.delete(key)).count();
    Ok(RespValue::integer(deleted as i64))
}

/// EXISTS key [key ...]; a key named twice counts twice
pub fn exists(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let store = ctx.store();
    let count = args.iter().filter(|key| store.exists(key)).count();
    Ok(RespValue::integer(count as i64))
}

/// RENAME / RENAMENX source destination, expiration moves along
pub fn rename(ctx: &mut CommandContext<'_>, args: &[Bytes], only_if_new: bool) -> Reply {
    let (source, destination) = (&args[0], &args[1]);
    let store = ctx.store();

    if !store.exists(source) {
        return Err(RespValue::error("ERR no such key"));
    }
    if only_if_new && source != destination && store.exists(destination) {
        return Ok(RespValue::integer(0));
    }

    if source != destination {
        if let Some(entry) = store.take(source) {
            store.put_entry(destination.clone(), entry);
        }
    }

    Ok(if only_if_new {
        RespValue::integer(1)
    } else {
        RespValue::ok()
    })
}

/// TYPE key
pub fn type_of(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let name = ctx.store().type_of(&args[0]).unwrap_or("none");
    Ok(RespValue::simple_string(name))
}

//! SCAN cursor [MATCH pattern] [COUNT count] [TYPE type]
//!
//! Keys are walked in the order of their SipHash; the cursor is the hash of
//! the next key to examine, so keys added or removed between calls never
//! make the walk skip a key that stayed in place.

use super::{keyword, parse_integer, syntax_error, CommandContext, Reply};
use crate::native::memory::pattern::matches_pattern;
use crate::native::memory::router::hash_key;
use crate::protocol::RespValue;
use bytes::Bytes;

const DEFAULT_COUNT: usize = 10;

struct ScanOptions {
    pattern: Option<Bytes>,
    count: usize,
    type_name: Option<String>,
}

fn parse_options(args: &[Bytes]) -> Result<ScanOptions, RespValue> {
    let mut options = ScanOptions {
        pattern: None,
        count: DEFAULT_COUNT,
        type_name: None,
    };

    let mut rest = args.iter();
    while let Some(option) = rest.next() {
        let value = rest.next().ok_or_else(syntax_error)?;
        match keyword(option).as_str() {
            "MATCH" => options.pattern = Some(value.clone()),
            "COUNT" => {
                let count = parse_integer(value)?;
                if count < 1 {
                    return Err(syntax_error());
                }
                options.count = count as usize;
            }
            "TYPE" => options.type_name = Some(String::from_utf8_lossy(value).to_lowercase()),
            _ => return Err(syntax_error()),
        }
    }
    Ok(options)
}

pub fn scan(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let cursor = std::str::from_utf8(&args[0])
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| RespValue::error("ERR invalid cursor"))?;
    let options = parse_options(&args[1..])?;

    let store = ctx.store();
    let mut ordered: Vec<(u64, Bytes)> = store
        .keys()
        .into_iter()
        .map(|key| (hash_key(&key), key))
        .collect();
    ordered.sort();

    let start = ordered.partition_point(|(hash, _)| *hash < cursor);
    let mut end = (start + options.count).min(ordered.len());
    // Never split keys sharing a hash across two calls
    while end < ordered.len() && end > start && ordered[end].0 == ordered[end - 1].0 {
        end += 1;
    }

    let mut keys = Vec::new();
    for (_, key) in &ordered[start..end] {
        if let Some(pattern) = &options.pattern {
            if !matches_pattern(key, pattern) {
                continue;
            }
        }
        if let Some(wanted) = &options.type_name {
            if store.type_of(key) != Some(wanted.as_str()) {
                continue;
            }
        }
        keys.push(RespValue::BulkString(key.clone()));
    }

    let next = match ordered.get(end) {
        Some((hash, _)) => (*hash).max(1),
        None => 0,
    };

    Ok(RespValue::Array(vec![
        RespValue::bulk_string(next.to_string()),
        RespValue::Array(keys),
    ]))
}

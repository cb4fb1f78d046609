//! Server commands (DBSIZE, FLUSHDB, INFO)

use super::{keyword, syntax_error, CommandContext, Reply};
use crate::protocol::RespValue;
use bytes::Bytes;

/// Version reported by INFO
const SERVER_VERSION: &str = "7.2.0";

/// DBSIZE
pub fn dbsize(ctx: &mut CommandContext<'_>) -> Reply {
    Ok(RespValue::integer(ctx.store().len() as i64))
}

/// FLUSHDB [ASYNC | SYNC]
pub fn flushdb(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    if let Some(mode) = args.first() {
        if !matches!(keyword(mode).as_str(), "ASYNC" | "SYNC") {
            return Err(syntax_error());
        }
    }
    ctx.store().clear();
    Ok(RespValue::ok())
}

/// INFO [section ...]; every section is always reported
pub fn info(ctx: &mut CommandContext<'_>) -> Reply {
    let mut text = String::new();
    text.push_str("# Server\r\n");
    text.push_str(&format!("redis_version:{}\r\n", SERVER_VERSION));
    text.push_str("redis_mode:standalone\r\n");
    text.push_str(&format!("node_name:{}\r\n", ctx.node.name()));
    text.push_str("\r\n# Clients\r\n");
    text.push_str(&format!("connected_clients:{}\r\n", ctx.node.clients().count()));
    text.push_str("\r\n# Keyspace\r\n");
    for (db, keys, expires) in ctx.node.keyspace() {
        text.push_str(&format!("db{}:keys={},expires={},avg_ttl=0\r\n", db, keys, expires));
    }
    Ok(RespValue::bulk_string(text))
}

#[cfg(test)]
mod tests {
    use super::super::testing::Fixture;
    use crate::command::CommandName;
    use crate::protocol::RespValue;

    #[test]
    fn test_dbsize_flushdb() {
        let mut fx = Fixture::new();
        fx.run(CommandName::MSet, &["a", "1", "b", "2"]);
        assert_eq!(fx.run(CommandName::DbSize, &[]), RespValue::integer(2));
        assert_eq!(fx.run(CommandName::FlushDb, &["ASYNC"]), RespValue::ok());
        assert_eq!(fx.run(CommandName::DbSize, &[]), RespValue::integer(0));
        assert!(fx.run(CommandName::FlushDb, &["LATER"]).is_error());
    }

    #[test]
    fn test_info_keyspace() {
        let mut fx = Fixture::new();
        fx.run(CommandName::Set, &["a", "1"]);
        fx.run(CommandName::Set, &["b", "2", "EX", "100"]);

        let info = fx.run(CommandName::Info, &[]);
        let text = info.as_str().unwrap();
        assert!(text.starts_with("# Server\r\n"));
        assert!(text.contains("connected_clients:1\r\n"));
        assert!(text.contains("db0:keys=2,expires=1,avg_ttl=0\r\n"));
    }
}

//! Connection commands (AUTH, SELECT, PING, CLIENT)

use super::{keyword, parse_integer, syntax_error, CommandContext, Reply};
use crate::native::memory::node::{ClientRecord, DATABASES};
use crate::protocol::RespValue;
use bytes::Bytes;

const DEFAULT_USER: &str = "default";

/// AUTH [username] password
pub fn auth(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let (username, password) = match args {
        [password] => (DEFAULT_USER.as_bytes(), password),
        [username, password] => (username.as_ref(), password),
        _ => return Err(syntax_error()),
    };

    let credentials = match ctx.node.credentials() {
        Some(credentials) => credentials.clone(),
        None if args.len() == 1 => {
            return Err(RespValue::error(
                "ERR AUTH <password> called without any password configured for the default user. \
                 Are you sure your configuration is correct?",
            ))
        }
        None => {
            return Err(RespValue::error(
                "WRONGPASS invalid username-password pair or user is disabled.",
            ))
        }
    };

    let expected_user = credentials.username.as_deref().unwrap_or(DEFAULT_USER);
    if username != expected_user.as_bytes() || password.as_ref() != credentials.password.as_bytes() {
        return Err(RespValue::error(
            "WRONGPASS invalid username-password pair or user is disabled.",
        ));
    }

    ctx.session.authenticated = true;
    Ok(RespValue::ok())
}

/// SELECT index
pub fn select(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let index = parse_integer(&args[0])?;
    if index < 0 || index >= DATABASES as i64 {
        return Err(RespValue::error("ERR DB index is out of range"));
    }
    let db = index as usize;
    ctx.session.db = db;
    if let Some(client) = ctx.node.client_mut(ctx.session.id) {
        client.db = db;
    }
    Ok(RespValue::ok())
}

/// PING [message]
pub fn ping(args: &[Bytes]) -> Reply {
    Ok(match args.first() {
        Some(message) => RespValue::BulkString(message.clone()),
        None => RespValue::simple_string("PONG"),
    })
}

/// CLIENT subcommand [arguments ...]
pub fn client(ctx: &mut CommandContext<'_>, args: &[Bytes]) -> Reply {
    let subcommand = keyword(&args[0]);
    let rest = &args[1..];
    let id = ctx.session.id;

    match (subcommand.as_str(), rest) {
        ("ID", []) => Ok(RespValue::integer(id as i64)),
        ("GETNAME", []) => Ok(ctx
            .node
            .client(id)
            .and_then(|client| client.name.clone())
            .map(RespValue::BulkString)
            .unwrap_or(RespValue::Null)),
        ("SETNAME", [name]) => {
            if name.iter().any(|b| !(b'!'..=b'~').contains(b)) {
                return Err(RespValue::error(
                    "ERR Client names cannot contain spaces, newlines or special characters.",
                ));
            }
            if let Some(client) = ctx.node.client_mut(id) {
                client.name = if name.is_empty() { None } else { Some(name.clone()) };
            }
            Ok(RespValue::ok())
        }
        ("SETINFO", [_, _]) => Ok(RespValue::ok()),
        ("INFO", []) => {
            let line = ctx
                .node
                .client(id)
                .map(|client| describe(id, client))
                .unwrap_or_default();
            Ok(RespValue::bulk_string(line))
        }
        ("LIST", []) => {
            let listing: String = ctx
                .node
                .clients()
                .map(|(id, client)| describe(*id, client))
                .collect();
            Ok(RespValue::bulk_string(listing))
        }
        ("KILL", [filter, value]) if keyword(filter) == "ID" => {
            let target = parse_integer(value)?;
            let killed = target >= 0 && ctx.node.disconnect_client(target as u64);
            Ok(RespValue::integer(killed as i64))
        }
        ("KILL", [address]) => {
            let target = std::str::from_utf8(address)
                .ok()
                .and_then(|addr| addr.strip_prefix("memory:"))
                .and_then(|id| id.parse::<u64>().ok());
            match target {
                Some(target) if ctx.node.disconnect_client(target) => Ok(RespValue::ok()),
                _ => Err(RespValue::error("ERR No such client")),
            }
        }
        ("ID" | "GETNAME" | "SETNAME" | "SETINFO" | "INFO" | "LIST" | "KILL", _) => {
            Err(RespValue::error(format!(
                "ERR wrong number of arguments for 'client|{}' command",
                subcommand.to_lowercase()
            )))
        }
        _ => Err(RespValue::error(format!(
            "ERR unknown subcommand '{}'. Try CLIENT HELP.",
            String::from_utf8_lossy(&args[0])
        ))),
    }
}

/// One CLIENT LIST line
fn describe(id: u64, client: &ClientRecord) -> String {
    let name = client
        .name
        .as_ref()
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .unwrap_or_default();
    format!(
        "id={} addr=memory:{} name={} db={} cmd={}\n",
        id,
        id,
        name,
        client.db,
        client.last_command.to_lowercase()
    )
}

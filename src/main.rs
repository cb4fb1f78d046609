use anyhow::{bail, Context};
use ferrumlink::{Command, CommandName, ConnectionRegistry, RegistryConfig, RespValue};
use std::str::FromStr;
use tracing::info;

const USAGE: &str = "usage: ferrumlink <config.json> <connection> <COMMAND> [ARGS..]";

fn main() -> anyhow::Result<()> {
    // Logging goes to stderr so replies stay clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        bail!(USAGE);
    }
    let (config_path, name, command, rest) = (&args[0], &args[1], &args[2], &args[3..]);

    let config = RegistryConfig::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path))?;
    let mut registry = ConnectionRegistry::new(config);
    let connection = registry.connection(name)?;

    let command_name = CommandName::from_str(command)?;
    info!("Running {} on {}", command_name, name);

    // SCAN streams keys instead of returning one cursor page
    if command_name == CommandName::Scan {
        if rest.len() > 1 {
            bail!("usage: ferrumlink <config.json> <connection> SCAN [pattern]");
        }
        for key in connection.scan(rest.first().map(String::as_str), None, false)? {
            println!("{}", String::from_utf8_lossy(&key?));
        }
        return Ok(());
    }

    let reply = connection.execute_raw(Command::new(command_name).args(rest))?;
    println!("{}", format_reply(&reply));
    Ok(())
}

/// Render a reply the way redis-cli does
fn format_reply(value: &RespValue) -> String {
    match value {
        RespValue::SimpleString(s) => s.clone(),
        RespValue::Error(e) => format!("(error) {}", e),
        RespValue::Integer(i) => format!("(integer) {}", i),
        RespValue::BulkString(bytes) => format!("\"{}\"", String::from_utf8_lossy(bytes)),
        RespValue::Double(d) => format!("(double) {}", d),
        RespValue::Boolean(b) => format!("({})", b),
        RespValue::Null => "(nil)".to_string(),
        RespValue::Array(arr) => {
            if arr.is_empty() {
                "(empty array)".to_string()
            } else {
                let items: Vec<String> = arr
                    .iter()
                    .enumerate()
                    .map(|(i, v)| format!("{}) {}", i + 1, format_reply(v)))
                    .collect();
                items.join("\n")
            }
        }
        RespValue::Map(pairs) => {
            if pairs.is_empty() {
                "(empty hash)".to_string()
            } else {
                let items: Vec<String> = pairs
                    .iter()
                    .enumerate()
                    .map(|(i, (k, v))| format!("{}# {} => {}", i + 1, format_reply(k), format_reply(v)))
                    .collect();
                items.join("\n")
            }
        }
    }
}

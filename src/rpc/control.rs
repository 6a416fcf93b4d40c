//! Control RPC methods
//!
//! - help: list commands, or show the usage of one command
//! - stop: request a graceful node shutdown

use crate::rpc::table::{CallContext, CommandOutput, CommandResult};
use crate::rpc::validation::{rpc_type_check, JsonType};
use serde_json::{json, Value};
use tracing::debug;

const HELP_USAGE: &str = "help [command]\nList commands, or get help for a command.";
const STOP_USAGE: &str = "stop\nStop Clam server.";

/// Params: ["command"] (optional)
pub fn help(ctx: &CallContext<'_>, params: &[Value], describe: bool) -> CommandResult {
    if describe || params.len() > 1 {
        return Ok(CommandOutput::Usage(HELP_USAGE.to_string()));
    }

    rpc_type_check(params, &[JsonType::Str], false)?;
    let filter = params.first().and_then(Value::as_str).unwrap_or("");

    Ok(CommandOutput::Value(json!(ctx.table.help(ctx, filter))))
}

/// Params: ["detach"] (optional, deprecated and ignored)
pub fn stop(ctx: &CallContext<'_>, params: &[Value], describe: bool) -> CommandResult {
    if describe || params.len() > 1 {
        return Ok(CommandOutput::Usage(STOP_USAGE.to_string()));
    }
    debug!("RPC: stop");

    // Shutdown happens asynchronously; reply first
    ctx.node.request_shutdown();
    Ok(CommandOutput::Value(json!("Clam server stopping")))
}

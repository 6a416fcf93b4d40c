//! RPC interface for the CLAM node
//!
//! JSON-RPC over HTTP/1.x with Basic authentication, optionally over TLS.
//! The listener and per-connection loop live in `server`; `dispatch` runs
//! calls against the `CommandTable` built here.

pub mod auth;
pub mod blockchain;
pub mod control;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod scheduler;
pub mod server;
pub mod table;
pub mod tls;
pub mod types;
pub mod validation;

pub use dispatch::RequestDispatcher;
pub use errors::{RpcError, RpcErrorCode, RpcResult};
pub use scheduler::DeferredTaskScheduler;
pub use server::{RpcServer, ServerError, ServerSettings};
pub use table::{CommandFlags, CommandTable, CommandTableBuilder, TableError};

/// Builder preloaded with the node's built-in commands.
///
/// Callers that want extra commands register them on the builder before
/// calling `build`.
pub fn default_command_builder() -> Result<CommandTableBuilder, TableError> {
    let always = CommandFlags::OK_SAFE_MODE | CommandFlags::THREAD_SAFE;
    CommandTable::builder()
        .command("help", always, control::help)?
        .command("stop", always, control::stop)?
        .command("getinfo", CommandFlags::OK_SAFE_MODE, blockchain::getinfo)?
        .command("getblockcount", CommandFlags::OK_SAFE_MODE, blockchain::getblockcount)?
        .command("getbestblockhash", CommandFlags::OK_SAFE_MODE, blockchain::getbestblockhash)?
        .command("getdifficulty", CommandFlags::OK_SAFE_MODE, blockchain::getdifficulty)?
        .command(
            "getconnectioncount",
            CommandFlags::OK_SAFE_MODE,
            blockchain::getconnectioncount,
        )
}

/// The built-in command table
pub fn default_command_table() -> Result<CommandTable, TableError> {
    Ok(default_command_builder()?.build())
}

//! RPC command table
//!
//! Maps method names to handlers and their dispatch flags. The table is built
//! once at startup and is read-only afterwards, so lookups need no locking.

use crate::node::NodeContext;
use crate::rpc::errors::RpcError;
use bitflags::bitflags;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

bitflags! {
    /// Dispatch policy for a command
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandFlags: u8 {
        /// May run while a safe-mode warning is active
        const OK_SAFE_MODE = 0b001;
        /// Runs without the chain-state and wallet locks
        const THREAD_SAFE = 0b010;
        /// Only available when a wallet is loaded
        const REQUIRES_WALLET = 0b100;
    }
}

/// What a handler produced
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Value(Value),
    /// Usage text, returned when the handler is asked to describe itself
    Usage(String),
}

pub type CommandResult = Result<CommandOutput, RpcError>;

/// Handler calling convention: `(context, params, describe)`.
///
/// With `describe == true` a handler returns `CommandOutput::Usage` with its
/// help text instead of executing.
pub type Handler = Arc<dyn Fn(&CallContext<'_>, &[Value], bool) -> CommandResult + Send + Sync>;

/// What a handler can reach while it runs
pub struct CallContext<'a> {
    pub node: &'a NodeContext,
    pub table: &'a CommandTable,
}

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub handler: Handler,
    pub flags: CommandFlags,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate RPC command: {0}")]
    DuplicateCommand(String),
}

/// Immutable name -> command map
#[derive(Debug)]
pub struct CommandTable {
    commands: HashMap<String, Command>,
}

impl CommandTable {
    pub fn builder() -> CommandTableBuilder {
        CommandTableBuilder::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Collect usage text.
    ///
    /// With an empty `filter` every command contributes the first line of its
    /// usage; otherwise only the named command contributes its full text.
    /// Handlers registered under several names are described once.
    pub fn help(&self, ctx: &CallContext<'_>, filter: &str) -> String {
        let mut described: HashSet<*const ()> = HashSet::new();
        let mut out = String::new();

        for name in self.names() {
            // Deprecated label aliases break the sort order of the listing
            if name.contains("label") {
                continue;
            }
            if !filter.is_empty() && name != filter {
                continue;
            }
            let Some(command) = self.lookup(name) else {
                continue;
            };
            if command.flags.contains(CommandFlags::REQUIRES_WALLET) && !ctx.node.has_wallet() {
                continue;
            }
            if !described.insert(Arc::as_ptr(&command.handler) as *const ()) {
                continue;
            }

            let text = match (command.handler)(ctx, &[], true) {
                Ok(CommandOutput::Usage(text)) => text,
                Err(err) => err.message,
                Ok(CommandOutput::Value(_)) => continue,
            };
            let text = if filter.is_empty() {
                text.split('\n').next().unwrap_or_default().to_string()
            } else {
                text
            };
            out.push_str(&text);
            out.push('\n');
        }

        if out.is_empty() {
            out = format!("help: unknown command: {}\n", filter);
        }
        out.pop();
        out
    }
}

#[derive(Default)]
pub struct CommandTableBuilder {
    commands: HashMap<String, Command>,
}

impl CommandTableBuilder {
    /// Register `handler` under `name`. Names must be unique.
    pub fn register(
        &mut self,
        name: &str,
        flags: CommandFlags,
        handler: Handler,
    ) -> Result<(), TableError> {
        if self.commands.contains_key(name) {
            return Err(TableError::DuplicateCommand(name.to_string()));
        }
        self.commands.insert(
            name.to_string(),
            Command {
                name: name.to_string(),
                handler,
                flags,
            },
        );
        Ok(())
    }

    pub fn command<F>(mut self, name: &str, flags: CommandFlags, handler: F) -> Result<Self, TableError>
    where
        F: Fn(&CallContext<'_>, &[Value], bool) -> CommandResult + Send + Sync + 'static,
    {
        self.register(name, flags, Arc::new(handler))?;
        Ok(self)
    }

    pub fn build(self) -> CommandTable {
        CommandTable {
            commands: self.commands,
        }
    }
}

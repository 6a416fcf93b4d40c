//! CLAM node - RPC server core
//!
//! The part of the node that accepts untrusted connections: HTTP Basic
//! authentication, the `rpcallowip` filter, JSON-RPC parsing and dispatch
//! under the chain-state lock, plus the network profile registry that ports
//! and policy are read from.
//!
//! ## Layout
//!
//! - `chainparams`: network profiles and the active selection
//! - `rpc`: command table, dispatcher, listener and connection servicer
//! - `node`: the state handed to RPC handlers
//! - `config`: file and command-line configuration
//! - `utils`: logging and signal handling for the binary
//!
//! ## Example
//!
//! ```rust,no_run
//! use clam_node::chainparams::NetworkRegistry;
//! use clam_node::node::NodeContext;
//! use clam_node::rpc::auth::RpcCredentials;
//! use clam_node::rpc::{default_command_table, RequestDispatcher, RpcServer, ServerSettings};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let registry = Arc::new(NetworkRegistry::new());
//! let node = Arc::new(NodeContext::new(Arc::clone(&registry)));
//! let dispatcher = RequestDispatcher::new(Arc::new(default_command_table()?), node);
//! let settings = ServerSettings::new(
//!     registry.active().rpc_port,
//!     RpcCredentials::new("clamrpc", "a-long-random-password"),
//! );
//! let mut server = RpcServer::start(settings, dispatcher)?;
//! server.stop();
//! # Ok(())
//! # }
//! ```

#[cfg(all(feature = "mimalloc", not(target_os = "windows")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod chainparams;
pub mod config;
pub mod node;
pub mod rpc;
pub mod utils;

pub use chainparams::{NetworkKind, NetworkProfile, NetworkRegistry};
pub use config::NodeConfig;
pub use node::NodeContext;

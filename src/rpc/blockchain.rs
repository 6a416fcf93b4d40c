//! Blockchain and status RPC methods
//!
//! Thin readers over the node's `ChainView`, `WalletInfo` and warning source.

use crate::chainparams::NetworkKind;
use crate::node::WarningKind;
use crate::rpc::table::{CallContext, CommandOutput, CommandResult};
use crate::rpc::validation::value_from_amount;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Peer protocol version reported by `getinfo`
pub const PROTOCOL_VERSION: i32 = 60014;

fn usage(text: &str) -> CommandResult {
    Ok(CommandOutput::Usage(text.to_string()))
}

pub fn getinfo(ctx: &CallContext<'_>, params: &[Value], describe: bool) -> CommandResult {
    if describe || !params.is_empty() {
        return usage("getinfo\nReturns an object containing various state info.");
    }
    debug!("RPC: getinfo");

    let node = ctx.node;
    let chain = node.chain();
    let mut obj = Map::new();
    obj.insert("version".into(), json!(concat!("v", env!("CARGO_PKG_VERSION"))));
    obj.insert("protocolversion".into(), json!(PROTOCOL_VERSION));
    if let Some(wallet) = node.wallet() {
        obj.insert("walletversion".into(), json!(wallet.wallet_version()));
        obj.insert("balance".into(), value_from_amount(wallet.balance()));
    }
    obj.insert("blocks".into(), json!(chain.block_count()));
    obj.insert("timeoffset".into(), json!(chain.time_offset()));
    obj.insert("connections".into(), json!(chain.connection_count()));
    obj.insert(
        "difficulty".into(),
        json!({ "proof-of-stake": chain.difficulty() }),
    );
    obj.insert(
        "testnet".into(),
        json!(node.network().active_kind() != NetworkKind::Main),
    );
    if let Some(wallet) = node.wallet() {
        obj.insert("keypoolsize".into(), json!(wallet.key_pool_size()));
        if let Some(until) = wallet.unlocked_until() {
            obj.insert("unlocked_until".into(), json!(until));
        }
    }
    obj.insert("errors".into(), json!(node.warnings(WarningKind::StatusBar)));

    Ok(CommandOutput::Value(Value::Object(obj)))
}

pub fn getblockcount(ctx: &CallContext<'_>, params: &[Value], describe: bool) -> CommandResult {
    if describe || !params.is_empty() {
        return usage("getblockcount\nReturns the number of blocks in the longest block chain.");
    }
    Ok(CommandOutput::Value(json!(ctx.node.chain().block_count())))
}

pub fn getbestblockhash(ctx: &CallContext<'_>, params: &[Value], describe: bool) -> CommandResult {
    if describe || !params.is_empty() {
        return usage("getbestblockhash\nReturns the hash of the best block in the longest block chain.");
    }
    Ok(CommandOutput::Value(json!(ctx.node.chain().best_block_hash())))
}

pub fn getdifficulty(ctx: &CallContext<'_>, params: &[Value], describe: bool) -> CommandResult {
    if describe || !params.is_empty() {
        return usage("getdifficulty\nReturns the difficulty as a multiple of the minimum difficulty.");
    }
    Ok(CommandOutput::Value(json!({
        "proof-of-stake": ctx.node.chain().difficulty()
    })))
}

pub fn getconnectioncount(ctx: &CallContext<'_>, params: &[Value], describe: bool) -> CommandResult {
    if describe || !params.is_empty() {
        return usage("getconnectioncount\nReturns the number of connections to other nodes.");
    }
    Ok(CommandOutput::Value(json!(ctx.node.chain().connection_count())))
}

//! Request dispatch
//!
//! Looks commands up, applies the wallet and safe-mode policy, takes the lock
//! scope a command needs and runs it. Whatever a handler does, the caller gets
//! back a `RpcResult`: errors and panics are turned into RPC errors here.

use crate::node::{NodeContext, WarningKind};
use crate::rpc::errors::{RpcError, RpcErrorCode, RpcResult};
use crate::rpc::table::{CallContext, Command, CommandFlags, CommandOutput, CommandTable};
use crate::rpc::types::{JsonRequest, RpcResponse};
use serde_json::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes calls against a command table
#[derive(Clone)]
pub struct RequestDispatcher {
    table: Arc<CommandTable>,
    node: Arc<NodeContext>,
}

impl RequestDispatcher {
    pub fn new(table: Arc<CommandTable>, node: Arc<NodeContext>) -> Self {
        Self { table, node }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn node(&self) -> &NodeContext {
        &self.node
    }

    /// Run `method` with `params`.
    pub fn execute(&self, method: &str, params: &[Value]) -> RpcResult<Value> {
        let command = self.table.lookup(method).ok_or_else(RpcError::method_not_found)?;

        if command.flags.contains(CommandFlags::REQUIRES_WALLET) && !self.node.has_wallet() {
            return Err(RpcError::new(
                RpcErrorCode::MethodNotFound,
                "Method not found (disabled)",
            ));
        }

        // Any rpc warning counts as safe mode
        let warning = self.node.warnings(WarningKind::Rpc);
        if !warning.is_empty()
            && !self.node.safe_mode_disabled()
            && !command.flags.contains(CommandFlags::OK_SAFE_MODE)
        {
            return Err(RpcError::forbidden_by_safe_mode(&warning));
        }

        if command.flags.contains(CommandFlags::THREAD_SAFE) {
            self.invoke(command, params)
        } else {
            let _state = self.node.lock_state();
            self.invoke(command, params)
        }
    }

    fn invoke(&self, command: &Command, params: &[Value]) -> RpcResult<Value> {
        let ctx = CallContext {
            node: &self.node,
            table: &self.table,
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| (command.handler)(&ctx, params, false)));
        match outcome {
            Ok(Ok(CommandOutput::Value(value))) => Ok(value),
            Ok(Ok(CommandOutput::Usage(text))) => Err(RpcError::misc(text)),
            Ok(Err(err)) => Err(err),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("RPC handler {} panicked: {}", command.name, message);
                Err(RpcError::misc(message))
            }
        }
    }

    /// Validate and execute one decoded request object.
    pub fn execute_value(&self, value: &Value) -> RpcResponse {
        match JsonRequest::parse(value) {
            Ok(request) => self.execute_request(&request),
            Err(invalid) => RpcResponse::error(&invalid.error, invalid.id),
        }
    }

    pub fn execute_request(&self, request: &JsonRequest) -> RpcResponse {
        log_method(&request.method);
        let result = self.execute(&request.method, &request.params);
        RpcResponse::from_result(result, request.id.clone())
    }

    /// Execute a batch in order. Each element succeeds or fails on its own.
    pub fn execute_batch(&self, batch: &[Value]) -> Vec<RpcResponse> {
        batch.iter().map(|value| self.execute_value(value)).collect()
    }
}

fn log_method(method: &str) {
    if method != "getblocktemplate" {
        debug!("ThreadRPCServer method={}", sanitize(method));
    }
}

/// Keep only characters that are safe to put in a log line
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || " .,;_/:?@-".contains(*c))
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown exception".to_string()
    }
}

//! RPC request and response types
//!
//! Requests are parsed from already-decoded JSON so that a malformed element
//! of a batch only affects its own slot. Responses always carry all three
//! members: `result`, `error` and `id`.

use crate::rpc::errors::{RpcError, RpcResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A validated JSON-RPC call
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    /// Opaque, echoed back verbatim; null when absent
    pub id: Value,
    pub method: String,
    pub params: Vec<Value>,
}

/// A request object that failed validation, with whatever id it carried
#[derive(Debug, Clone, PartialEq)]
pub struct RequestError {
    pub id: Value,
    pub error: RpcError,
}

impl JsonRequest {
    /// Validate one request object.
    ///
    /// The id is read before anything else so that every failure past the
    /// "not an object" check can still be echoed with the caller's id.
    pub fn parse(value: &Value) -> Result<Self, RequestError> {
        let object = value.as_object().ok_or_else(|| RequestError {
            id: Value::Null,
            error: RpcError::invalid_request("Invalid Request object"),
        })?;

        let id = object.get("id").cloned().unwrap_or(Value::Null);
        let fail = |message: &str| RequestError {
            id: id.clone(),
            error: RpcError::invalid_request(message),
        };

        let method = match object.get("method") {
            None | Some(Value::Null) => return Err(fail("Missing method")),
            Some(Value::String(method)) => method.clone(),
            Some(_) => return Err(fail("Method must be a string")),
        };

        let params = match object.get("params") {
            Some(Value::Array(params)) => params.clone(),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => return Err(fail("Params must be an array")),
        };

        Ok(Self { id, method, params })
    }
}

/// The `error` member of a response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<&RpcError> for ErrorObject {
    fn from(err: &RpcError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            data: err.data.clone(),
        }
    }
}

/// RPC response envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Value,
    pub error: Option<ErrorObject>,
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    /// Create a successful response
    pub fn success(result: Value, id: Value) -> Self {
        Self {
            result,
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(error: &RpcError, id: Value) -> Self {
        Self {
            result: Value::Null,
            error: Some(error.into()),
            id,
        }
    }

    pub fn from_result(result: RpcResult<Value>, id: Value) -> Self {
        match result {
            Ok(value) => Self::success(value, id),
            Err(err) => Self::error(&err, id),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Serialized body line as written on the wire
    pub fn to_body(&self) -> String {
        let mut body = serde_json::to_string(self).unwrap_or_else(|_| "null".to_string());
        body.push('\n');
        body
    }
}

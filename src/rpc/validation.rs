//! RPC Input Validation Utilities
//!
//! Parameter type checks and amount formatting shared by command handlers.

use crate::rpc::errors::{RpcError, RpcResult};
use serde_json::Value;

/// Base units per coin
pub const COIN: i64 = 100_000_000;

/// JSON value kinds as named in type errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Bool,
    Object,
    Array,
    Str,
    Num,
}

impl JsonType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Bool,
            Value::Object(_) => JsonType::Object,
            Value::Array(_) => JsonType::Array,
            Value::String(_) => JsonType::Str,
            Value::Number(_) => JsonType::Num,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Bool => "bool",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Str => "string",
            JsonType::Num => "number",
        }
    }
}

/// Check positional parameter types.
///
/// Only the parameters actually present are checked; missing trailing
/// parameters are the handler's business.
pub fn rpc_type_check(params: &[Value], expected: &[JsonType], allow_null: bool) -> RpcResult<()> {
    for (value, want) in params.iter().zip(expected) {
        let actual = JsonType::of(value);
        if actual != *want && !(allow_null && actual == JsonType::Null) {
            return Err(RpcError::type_error(format!(
                "Expected type {}, got {}",
                want.name(),
                actual.name()
            )));
        }
    }
    Ok(())
}

/// Base units to a JSON number in coins
pub fn value_from_amount(amount: i64) -> Value {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let coin = COIN as u64;
    let text = format!("{}{}.{:08}", sign, abs / coin, abs % coin);
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::errors::RpcErrorCode;
    use serde_json::json;

    #[test]
    fn test_type_check_positional() {
        let params = vec![json!(1), json!("a")];
        assert!(rpc_type_check(&params, &[JsonType::Num, JsonType::Str], false).is_ok());
        // Extra expectations beyond the supplied params are ignored
        assert!(rpc_type_check(&params, &[JsonType::Num, JsonType::Str, JsonType::Bool], false).is_ok());

        let err = rpc_type_check(&params, &[JsonType::Str], false).unwrap_err();
        assert_eq!(err.code, RpcErrorCode::TypeError);
        assert_eq!(err.message, "Expected type string, got number");
    }

    #[test]
    fn test_type_check_null_handling() {
        let params = vec![Value::Null];
        assert!(rpc_type_check(&params, &[JsonType::Num], true).is_ok());
        let err = rpc_type_check(&params, &[JsonType::Num], false).unwrap_err();
        assert_eq!(err.message, "Expected type number, got null");
    }

    #[test]
    fn test_value_from_amount() {
        assert_eq!(value_from_amount(150_000_000), json!(1.5));
        assert_eq!(value_from_amount(1), json!(0.00000001));
        assert_eq!(value_from_amount(-250_000_000), json!(-2.5));
        assert_eq!(value_from_amount(0), json!(0.0));
    }
}

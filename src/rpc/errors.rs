//! RPC Error Types
//!
//! JSON-RPC error codes used by the node and the `RpcError` value handlers
//! and the dispatcher return. Clients match on the integer code, never on the
//! message text.

use http::StatusCode;
use serde_json::{json, Value};
use std::fmt;

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    // Standard JSON-RPC 2.0 errors
    /// Parse error (-32700)
    ParseError,
    /// Invalid request (-32600)
    InvalidRequest,
    /// Method not found (-32601)
    MethodNotFound,
    /// Invalid params (-32602)
    InvalidParams,
    /// Internal error (-32603)
    InternalError,

    // General application defined errors
    /// std::exception thrown in command handling (-1)
    MiscError,
    /// Server is in safe mode, and command is not allowed in safe mode (-2)
    ForbiddenBySafeMode,
    /// Unexpected type was passed as parameter (-3)
    TypeError,
    /// Invalid address or key (-5)
    InvalidAddressOrKey,
    /// Ran out of memory during operation (-7)
    OutOfMemory,
    /// Invalid, missing or duplicate parameter (-8)
    InvalidParameter,
    /// Database error (-20)
    DatabaseError,
    /// Error parsing or validating structure in raw format (-22)
    DeserializationError,

    // P2P client errors
    /// Node is not connected (-9)
    ClientNotConnected,
    /// Still downloading initial blocks (-10)
    ClientInInitialDownload,

    // Wallet errors
    /// Unspecified problem with wallet (-4)
    WalletError,
    /// Not enough funds in wallet or account (-6)
    WalletInsufficientFunds,
    /// Invalid account name (-11)
    WalletInvalidAccountName,
    /// Keypool ran out, call keypoolrefill first (-12)
    WalletKeypoolRanOut,
    /// Enter the wallet passphrase with walletpassphrase first (-13)
    WalletUnlockNeeded,
    /// The wallet passphrase entered was incorrect (-14)
    WalletPassphraseIncorrect,
    /// Command given in wrong wallet encryption state (-15)
    WalletWrongEncState,
    /// Failed to encrypt the wallet (-16)
    WalletEncryptionFailed,
    /// Wallet is already unlocked (-17)
    WalletAlreadyUnlocked,
}

impl RpcErrorCode {
    /// Get numeric error code
    pub fn code(&self) -> i32 {
        match self {
            RpcErrorCode::ParseError => -32700,
            RpcErrorCode::InvalidRequest => -32600,
            RpcErrorCode::MethodNotFound => -32601,
            RpcErrorCode::InvalidParams => -32602,
            RpcErrorCode::InternalError => -32603,
            RpcErrorCode::MiscError => -1,
            RpcErrorCode::ForbiddenBySafeMode => -2,
            RpcErrorCode::TypeError => -3,
            RpcErrorCode::InvalidAddressOrKey => -5,
            RpcErrorCode::OutOfMemory => -7,
            RpcErrorCode::InvalidParameter => -8,
            RpcErrorCode::DatabaseError => -20,
            RpcErrorCode::DeserializationError => -22,
            RpcErrorCode::ClientNotConnected => -9,
            RpcErrorCode::ClientInInitialDownload => -10,
            RpcErrorCode::WalletError => -4,
            RpcErrorCode::WalletInsufficientFunds => -6,
            RpcErrorCode::WalletInvalidAccountName => -11,
            RpcErrorCode::WalletKeypoolRanOut => -12,
            RpcErrorCode::WalletUnlockNeeded => -13,
            RpcErrorCode::WalletPassphraseIncorrect => -14,
            RpcErrorCode::WalletWrongEncState => -15,
            RpcErrorCode::WalletEncryptionFailed => -16,
            RpcErrorCode::WalletAlreadyUnlocked => -17,
        }
    }

    /// Default message for the code
    pub fn message(&self) -> &'static str {
        match self {
            RpcErrorCode::ParseError => "Parse error",
            RpcErrorCode::InvalidRequest => "Invalid Request object",
            RpcErrorCode::MethodNotFound => "Method not found",
            RpcErrorCode::InvalidParams => "Invalid params",
            RpcErrorCode::InternalError => "Internal error",
            RpcErrorCode::MiscError => "Unknown error",
            RpcErrorCode::ForbiddenBySafeMode => "Safe mode",
            RpcErrorCode::TypeError => "Type error",
            RpcErrorCode::InvalidAddressOrKey => "Invalid address or key",
            RpcErrorCode::OutOfMemory => "Out of memory",
            RpcErrorCode::InvalidParameter => "Invalid parameter",
            RpcErrorCode::DatabaseError => "Database error",
            RpcErrorCode::DeserializationError => "Deserialization error",
            RpcErrorCode::ClientNotConnected => "Clam is not connected!",
            RpcErrorCode::ClientInInitialDownload => "Clam is downloading blocks...",
            RpcErrorCode::WalletError => "Wallet error",
            RpcErrorCode::WalletInsufficientFunds => "Insufficient funds",
            RpcErrorCode::WalletInvalidAccountName => "Invalid account name",
            RpcErrorCode::WalletKeypoolRanOut => {
                "Keypool ran out, please call keypoolrefill first"
            }
            RpcErrorCode::WalletUnlockNeeded => {
                "Please enter the wallet passphrase with walletpassphrase first."
            }
            RpcErrorCode::WalletPassphraseIncorrect => {
                "The wallet passphrase entered was incorrect."
            }
            RpcErrorCode::WalletWrongEncState => "Wallet is in the wrong encryption state",
            RpcErrorCode::WalletEncryptionFailed => "Failed to encrypt the wallet",
            RpcErrorCode::WalletAlreadyUnlocked => "Wallet is already unlocked.",
        }
    }

    /// HTTP status used when this error ends the connection
    pub fn http_status(&self) -> StatusCode {
        match self {
            RpcErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            RpcErrorCode::MethodNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// RPC Error structure
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcError {
    /// Create a new RPC error
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error with additional data
    pub fn with_data(code: RpcErrorCode, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found() -> Self {
        Self::new(RpcErrorCode::MethodNotFound, "Method not found")
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidParams, message)
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidParameter, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::TypeError, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalError, message)
    }

    /// Generic handler failure
    pub fn misc(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::MiscError, message)
    }

    /// Command refused while a warning is active
    pub fn forbidden_by_safe_mode(warning: &str) -> Self {
        Self::new(
            RpcErrorCode::ForbiddenBySafeMode,
            format!("Safe mode: {}", warning),
        )
    }

    /// The `{code, message}` error object
    pub fn to_object(&self) -> Value {
        let mut error = json!({
            "code": self.code.code(),
            "message": self.message,
        });

        if let Some(data) = &self.data {
            error["data"] = data.clone();
        }
        error
    }

    /// Full JSON-RPC reply carrying this error
    pub fn to_json(&self, id: Value) -> Value {
        json!({
            "result": Value::Null,
            "error": self.to_object(),
            "id": id
        })
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC Error {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for RpcError {}

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;

/// Convert anyhow error to RPC error
impl From<anyhow::Error> for RpcError {
    fn from(err: anyhow::Error) -> Self {
        RpcError::misc(err.to_string())
    }
}

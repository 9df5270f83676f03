//! MCP-specific error types and mapping to JSON-RPC error codes.

use crate::error::BearError;
use rmcp::model::ErrorCode;
use rmcp::ErrorData as RmcpError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Custom MCP error codes (in the -32000 to -32099 range for server errors)
pub mod error_codes {
    pub const NOTE_NOT_FOUND: i32 = -32001;
    pub const INVALID_INPUT: i32 = -32003;
    pub const STORE_UNAVAILABLE: i32 = -32010;
    pub const INTERNAL_ERROR: i32 = -32011;
    pub const STORE_SCHEMA: i32 = -32012;
    pub const DISPATCH_FAILURE: i32 = -32013;
}

/// MCP-specific error types with detailed context.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum McpError {
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    #[error("Invalid input for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("Invalid value '{value}' for field '{field}'. Valid values: {}", valid.join(", "))]
    InvalidEnumValue {
        field: String,
        value: String,
        valid: Vec<String>,
    },

    #[error("Bear database unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Bear database schema mismatch: {message}")]
    StoreSchema { message: String },

    #[error("Could not dispatch command to Bear: {message}")]
    DispatchFailure { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl McpError {
    /// Get the JSON-RPC error code for this error type.
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::NoteNotFound { .. } => error_codes::NOTE_NOT_FOUND,
            McpError::InvalidInput { .. } | McpError::InvalidEnumValue { .. } => {
                error_codes::INVALID_INPUT
            }
            McpError::StoreUnavailable { .. } => error_codes::STORE_UNAVAILABLE,
            McpError::StoreSchema { .. } => error_codes::STORE_SCHEMA,
            McpError::DispatchFailure { .. } => error_codes::DISPATCH_FAILURE,
            McpError::InternalError { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// Get the error type name for the data payload.
    pub fn error_type(&self) -> &'static str {
        match self {
            McpError::NoteNotFound { .. } => "NotFound",
            McpError::InvalidInput { .. } => "InvalidInput",
            McpError::InvalidEnumValue { .. } => "InvalidInput",
            McpError::StoreUnavailable { .. } => "StoreUnavailable",
            McpError::StoreSchema { .. } => "StoreSchemaError",
            McpError::DispatchFailure { .. } => "DispatchFailure",
            McpError::InternalError { .. } => "InternalError",
        }
    }

    /// Convert to rmcp ErrorData for JSON-RPC response.
    pub fn to_rmcp_error(&self) -> RmcpError {
        RmcpError {
            code: ErrorCode(self.error_code()),
            message: self.to_string().into(),
            data: Some(json!({
                "error_type": self.error_type(),
                "details": self.clone()
            })),
        }
    }
}

impl From<McpError> for RmcpError {
    fn from(err: McpError) -> Self {
        err.to_rmcp_error()
    }
}

impl From<BearError> for McpError {
    fn from(err: BearError) -> Self {
        match err {
            BearError::InvalidInput { field, message } => McpError::InvalidInput { field, message },
            BearError::NotFound(id) => McpError::NoteNotFound { id },
            BearError::StoreUnavailable(message) => McpError::StoreUnavailable { message },
            BearError::StoreSchema(message) => McpError::StoreSchema { message },
            BearError::Dispatch(message) => McpError::DispatchFailure { message },
            BearError::Server(message) => McpError::InternalError { message },
            BearError::Io(e) => McpError::InternalError {
                message: format!("IO error: {}", e),
            },
            BearError::Json(e) => McpError::InternalError {
                message: format!("JSON error: {}", e),
            },
        }
    }
}

//! Error types for mcp-learning-server.
//!
//! Everything a caller can trigger through the dispatcher is a
//! [`DispatchError`]. Those errors are converted into JSON-RPC error
//! responses (or `isError` tool results) at the server boundary and never
//! escape as process faults. Startup problems use [`ConfigError`] and
//! [`RegistryError`], which are fatal.

use std::path::PathBuf;

use serde_json::json;
use thiserror::Error;

use crate::mcp::protocol::{ErrorCode, JsonRpcError, JsonRpcErrorData, RequestId};
use crate::mcp::schema::SchemaViolation;
use crate::tools::calculator::CalcError;

/// MCP error code for an unknown resource URI.
pub const RESOURCE_NOT_FOUND: i32 = -32002;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised while assembling the registries at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Two tools were registered under the same name.
    #[error("tool registered twice: {name}")]
    DuplicateTool {
        /// The clashing tool name.
        name: String,
    },

    /// Two resources were registered under the same URI.
    #[error("resource registered twice: {uri}")]
    DuplicateResource {
        /// The clashing URI or URI pattern.
        uri: String,
    },

    /// Two prompts were registered under the same name.
    #[error("prompt registered twice: {name}")]
    DuplicatePrompt {
        /// The clashing prompt name.
        name: String,
    },

    /// The notes directory cannot be expressed as a glob pattern.
    #[error("invalid notes directory: {path}")]
    InvalidNotesDir {
        /// The offending directory.
        path: PathBuf,
    },
}

/// Errors produced while routing an operation to its handler.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No tool is registered under this name.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// Requested tool name.
        name: String,
    },

    /// The URI matches neither a literal resource nor a resource pattern.
    #[error("Unknown resource URI: {uri}")]
    UnknownResource {
        /// Requested URI.
        uri: String,
    },

    /// No prompt is registered under this name.
    #[error("Unknown prompt: {name}")]
    UnknownPrompt {
        /// Requested prompt name.
        name: String,
    },

    /// The arguments do not satisfy the declared schema.
    #[error("Invalid arguments for '{target}': {source}")]
    InvalidArguments {
        /// Tool or prompt whose schema was violated.
        target: String,
        /// What was wrong.
        #[source]
        source: SchemaViolation,
    },

    /// No task has this identifier.
    #[error("Task with ID {id} not found.")]
    TaskNotFound {
        /// Requested task ID, as sent by the client.
        id: i64,
    },

    /// The calculator rejected its input.
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalcError),

    /// The resource is known but its backing file could not be read.
    #[error("Resource unavailable: {uri}")]
    ResourceUnavailable {
        /// Requested URI.
        uri: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Something that should not happen did.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the fault.
        message: String,
    },
}

impl DispatchError {
    /// Returns `true` for errors raised by a tool handler itself.
    ///
    /// These are reported to the caller as tool results with `isError`
    /// set, not as JSON-RPC errors.
    #[must_use]
    pub const fn is_handler_error(&self) -> bool {
        matches!(self, Self::TaskNotFound { .. } | Self::Calculation(_))
    }

    /// Returns the JSON-RPC error code used to report this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnknownTool { .. }
            | Self::UnknownPrompt { .. }
            | Self::InvalidArguments { .. }
            | Self::TaskNotFound { .. }
            | Self::Calculation(_) => ErrorCode::InvalidParams,
            Self::UnknownResource { .. } => ErrorCode::ServerError(RESOURCE_NOT_FOUND),
            Self::ResourceUnavailable { .. } | Self::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Converts this error into a JSON-RPC error response for `id`.
    #[must_use]
    pub fn to_jsonrpc(&self, id: RequestId) -> JsonRpcError {
        let mut data = JsonRpcErrorData::with_message(self.error_code(), self.to_string());
        match self {
            Self::UnknownResource { uri } | Self::ResourceUnavailable { uri, .. } => {
                data = data.with_data(json!({ "uri": uri }));
            }
            Self::InvalidArguments { target, source } => {
                data = data.with_data(json!({ "target": target, "reason": source.to_string() }));
            }
            _ => {}
        }
        JsonRpcError::new(Some(id), data)
    }
}

/// Errors seen by the JSON-RPC client harness.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Reading from or writing to the transport failed.
    #[error("transport error")]
    Io(#[from] std::io::Error),

    /// The server sent a line that is not a JSON-RPC reply.
    #[error("malformed reply from server")]
    Malformed(#[source] serde_json::Error),

    /// The server answered with a JSON-RPC error.
    #[error("server returned error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i32,
        /// Error message from the server.
        message: String,
    },

    /// The server closed the connection before replying.
    #[error("connection closed by server")]
    Closed,

    /// The reply was valid JSON-RPC but not what the request expected.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the mismatch.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn handler_errors_are_classified() {
        assert!(DispatchError::TaskNotFound { id: 9 }.is_handler_error());
        assert!(DispatchError::Calculation(CalcError::DivisionByZero).is_handler_error());
        assert!(!DispatchError::UnknownTool {
            name: "nope".to_string()
        }
        .is_handler_error());
    }

    #[test]
    fn unknown_resource_maps_to_resource_not_found() {
        let error = DispatchError::UnknownResource {
            uri: "bogus://thing".to_string(),
        };
        let rpc = error.to_jsonrpc(RequestId::Number(3));
        assert_eq!(rpc.error.code, RESOURCE_NOT_FOUND);
        assert_eq!(rpc.id, Some(RequestId::Number(3)));
        assert_eq!(rpc.error.data, Some(json!({ "uri": "bogus://thing" })));
    }

    #[test]
    fn invalid_arguments_maps_to_invalid_params() {
        let error = DispatchError::InvalidArguments {
            target: "add_task".to_string(),
            source: SchemaViolation::MissingField {
                name: "title".to_string(),
            },
        };
        let rpc = error.to_jsonrpc(RequestId::Number(1));
        assert_eq!(rpc.error.code, ErrorCode::InvalidParams.code());
        assert!(rpc.error.message.contains("add_task"));
        assert!(rpc.error.message.contains("title"));
    }

    #[test]
    fn task_not_found_display() {
        let msg = DispatchError::TaskNotFound { id: 42 }.to_string();
        assert_eq!(msg, "Task with ID 42 not found.");
    }
}

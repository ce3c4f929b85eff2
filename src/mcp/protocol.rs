//! JSON-RPC 2.0 framing for the learning server.
//!
//! Server side: [`parse_message`] turns a line into an [`IncomingMessage`],
//! and replies go out as [`JsonRpcResponse`] or [`JsonRpcError`]. Client
//! side: the harness writes [`OutgoingRequest`]/[`OutgoingNotification`]
//! and reads lines back with [`parse_reply`].
//!
//! MCP narrows JSON-RPC in one way that matters here: request ids are
//! strings or integers, never `null`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value of the `jsonrpc` member on every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name used when the configuration does not override it.
pub const DEFAULT_SERVER_NAME: &str = "mcp-learning-server";

/// Identifies a request and the reply that answers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer id.
    Number(i64),
    /// String id.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => fmt::Display::fmt(n, f),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// A request received by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// Echoed back on the reply.
    pub id: RequestId,
    /// Method name, never empty.
    pub method: String,
    /// Raw parameters, if any were sent.
    pub params: Option<Value>,
}

/// A notification received by the server. No reply is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcNotification {
    /// Method name, never empty.
    pub method: String,
    /// Raw parameters, if any were sent.
    pub params: Option<Value>,
}

/// A line from the client, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    /// Carries an id and expects a reply.
    Request(JsonRpcRequest),
    /// Carries no id.
    Notification(JsonRpcNotification),
}

/// A notification written by the client harness.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingNotification {
    jsonrpc: &'static str,
    /// Method name.
    pub method: String,
    /// Parameters, omitted when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl OutgoingNotification {
    /// Builds a notification for `method`.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        }
    }

    /// The notification a client sends once it has processed the
    /// `initialize` response.
    #[must_use]
    pub fn initialized() -> Self {
        Self::new("notifications/initialized", None)
    }
}

/// A request written by the client harness.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingRequest {
    jsonrpc: &'static str,
    /// Request id, unique per client session.
    pub id: RequestId,
    /// Method name.
    pub method: String,
    /// Parameters, omitted when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl OutgoingRequest {
    /// Builds a request for `method`.
    #[must_use]
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// A successful reply.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: &'static str,
    /// Id of the request being answered.
    pub id: RequestId,
    /// Method result.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Wraps `result` as the reply to `id`.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// JSON-RPC error codes used by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The line was not valid JSON.
    ParseError,
    /// Valid JSON, but not a request or notification.
    InvalidRequest,
    /// No such method.
    MethodNotFound,
    /// Parameters missing, malformed, or naming something unregistered.
    InvalidParams,
    /// The server failed while handling a valid request.
    InternalError,
    /// An application-defined code.
    ServerError(i32),
}

impl ErrorCode {
    const fn parts(self) -> (i32, &'static str) {
        match self {
            Self::ParseError => (-32700, "Parse error"),
            Self::InvalidRequest => (-32600, "Invalid Request"),
            Self::MethodNotFound => (-32601, "Method not found"),
            Self::InvalidParams => (-32602, "Invalid params"),
            Self::InternalError => (-32603, "Internal error"),
            Self::ServerError(code) => (code, "Server error"),
        }
    }

    /// Numeric value sent on the wire.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.parts().0
    }

    /// Message used when nothing more specific is known.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        self.parts().1
    }
}

/// The `error` member of a failed reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Error code.
    pub code: i32,
    /// Human-readable summary.
    pub message: String,
    /// Structured detail, omitted when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// An error with a specific message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured detail.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<ErrorCode> for JsonRpcErrorData {
    fn from(code: ErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }
}

/// A failed reply.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    jsonrpc: &'static str,
    /// Id of the request being answered; `null` when it could not be read.
    pub id: Option<RequestId>,
    /// Error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Wraps `error` as the reply to `id`.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }

    /// The line was not a JSON object.
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(None, ErrorCode::ParseError.into())
    }

    /// The object is not a well-formed request or notification.
    #[must_use]
    pub fn invalid_request(id: Option<RequestId>) -> Self {
        Self::new(id, ErrorCode::InvalidRequest.into())
    }

    /// `method` is not served.
    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// The request parameters could not be used.
    #[must_use]
    pub fn invalid_params(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorCode::InvalidParams, message),
        )
    }
}

/// A reply as seen by the client harness.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcReply {
    /// Version marker as sent.
    pub jsonrpc: String,
    /// Id of the request answered; `None` for parse errors.
    #[serde(default)]
    pub id: Option<RequestId>,
    /// Present on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// Present on failure.
    #[serde(default)]
    pub error: Option<JsonRpcErrorData>,
}

impl JsonRpcReply {
    /// Splits the reply into its result or its error.
    ///
    /// A reply carrying neither is treated as a `null` result.
    ///
    /// # Errors
    ///
    /// Returns the error object if the server reported a failure.
    pub fn into_result(self) -> Result<Value, JsonRpcErrorData> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(error),
            (result, None) => Ok(result.unwrap_or(Value::Null)),
        }
    }
}

/// Classifies one line from the client.
///
/// An object with an `id` member is a request, one without is a
/// notification.
///
/// # Errors
///
/// Returns a parse error for anything that is not a JSON object, and an
/// invalid-request error for a wrong version marker, an unusable id, or a
/// missing or empty method. The id is kept on the error when it was
/// readable.
pub fn parse_message(json: &str) -> Result<IncomingMessage, JsonRpcError> {
    let mut object: Map<String, Value> =
        serde_json::from_str(json).map_err(|_| JsonRpcError::parse_error())?;

    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(JsonRpcError::invalid_request(None));
    }

    let id = object
        .remove("id")
        .map(serde_json::from_value::<RequestId>)
        .transpose()
        .map_err(|_| JsonRpcError::invalid_request(None))?;

    let method = match object.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => return Err(JsonRpcError::invalid_request(id)),
    };
    let params = object.remove("params");

    Ok(match id {
        Some(id) => IncomingMessage::Request(JsonRpcRequest { id, method, params }),
        None => IncomingMessage::Notification(JsonRpcNotification { method, params }),
    })
}

/// Parses a line written by the server into a reply.
///
/// # Errors
///
/// Returns the JSON error if the line is not a reply object.
pub fn parse_reply(json: &str) -> Result<JsonRpcReply, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(json: &str) -> JsonRpcRequest {
        match parse_message(json) {
            Ok(IncomingMessage::Request(req)) => req,
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn request_with_integer_id() {
        let req = request(r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {}}"#);
        assert_eq!(req.id, RequestId::Number(1));
        assert_eq!(req.method, "tools/list");
        assert_eq!(req.params, Some(json!({})));
    }

    #[test]
    fn request_with_string_id() {
        let req = request(r#"{"jsonrpc": "2.0", "id": "read-7", "method": "resources/read"}"#);
        assert_eq!(req.id, RequestId::String("read-7".to_string()));
        assert!(req.params.is_none());
    }

    #[test]
    fn message_without_id_is_notification() {
        match parse_message(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#) {
            Ok(IncomingMessage::Notification(notif)) => {
                assert_eq!(notif.method, "notifications/initialized");
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn malformed_lines_are_parse_errors() {
        for line in ["not valid json", "[1, 2]", "42"] {
            let err = parse_message(line).unwrap_err();
            assert_eq!(err.error.code, -32700, "{line}");
            assert!(err.id.is_none());
        }
    }

    #[test]
    fn wrong_version_or_id_is_invalid_request() {
        for line in [
            r#"{"id": 1, "method": "ping"}"#,
            r#"{"jsonrpc": "1.0", "id": 1, "method": "ping"}"#,
            r#"{"jsonrpc": "2.0", "id": null, "method": "ping"}"#,
            r#"{"jsonrpc": "2.0", "id": 1.5, "method": "ping"}"#,
        ] {
            let err = parse_message(line).unwrap_err();
            assert_eq!(err.error.code, ErrorCode::InvalidRequest.code(), "{line}");
            assert!(err.id.is_none());
        }
    }

    #[test]
    fn empty_method_keeps_id() {
        let err = parse_message(r#"{"jsonrpc": "2.0", "id": 7, "method": ""}"#).unwrap_err();
        assert_eq!(err.error.code, ErrorCode::InvalidRequest.code());
        assert_eq!(err.id, Some(RequestId::Number(7)));
    }

    #[test]
    fn error_reply_wire_shape() {
        let error = JsonRpcError::method_not_found(RequestId::Number(1), "sampling/createMessage");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32601, "message": "Method not found: sampling/createMessage"}
            })
        );

        let parse = serde_json::to_value(JsonRpcError::parse_error()).unwrap();
        assert_eq!(parse.get("id"), Some(&Value::Null));
        assert_eq!(parse["error"]["message"], "Parse error");
    }

    #[test]
    fn outgoing_request_omits_missing_params() {
        let request = OutgoingRequest::new(RequestId::Number(4), "tools/list", None);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":4,"method":"tools/list"}"#);
    }

    #[test]
    fn reply_with_error_is_err() {
        let reply =
            parse_reply(r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"nope"}}"#)
                .unwrap();
        assert_eq!(reply.id, Some(RequestId::Number(2)));
        let error = reply.into_result().unwrap_err();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "nope");
    }

    #[test]
    fn reply_with_result_is_ok() {
        let reply = parse_reply(r#"{"jsonrpc":"2.0","id":"x","result":{"ok":true}}"#).unwrap();
        assert_eq!(reply.into_result().unwrap(), json!({"ok": true}));
    }

    #[test]
    fn request_id_display() {
        assert_eq!(RequestId::Number(42).to_string(), "42");
        assert_eq!(RequestId::String("abc".to_string()).to_string(), "abc");
    }
}

//! JSON-RPC client for driving an MCP server.
//!
//! [`McpClient`] speaks the same newline-framed protocol as the server and
//! works over any [`Transport`]. [`in_process`] pairs a client with a
//! server over an in-memory pipe; poll both futures together (for example
//! with `tokio::join!`) and call [`McpClient::close`] when done so the
//! server sees EOF and returns.
//!
//! ```no_run
//! # async fn demo(dispatcher: mcp_learning_server::mcp::Dispatcher) {
//! use mcp_learning_server::mcp::client::in_process;
//!
//! let (mut server, mut client) = in_process(dispatcher);
//! let (served, tools) = tokio::join!(server.serve(), async {
//!     client.initialize("docs").await?;
//!     let tools = client.list_tools().await;
//!     client.close().await?;
//!     tools
//! });
//! # let _ = (served, tools);
//! # }
//! ```

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader, DuplexStream, ReadHalf, WriteHalf};

use crate::error::ClientError;
use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::protocol::{
    parse_reply, OutgoingNotification, OutgoingRequest, RequestId, MCP_PROTOCOL_VERSION,
};
use crate::mcp::server::McpServer;
use crate::mcp::transport::Transport;

/// Size of each direction of the in-process pipe.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Reader half of an in-process connection.
pub type PipeReader = BufReader<ReadHalf<DuplexStream>>;

/// Writer half of an in-process connection.
pub type PipeWriter = WriteHalf<DuplexStream>;

/// Server end of an in-process connection.
pub type InProcessServer = McpServer<PipeReader, PipeWriter>;

/// Client end of an in-process connection.
pub type InProcessClient = McpClient<PipeReader, PipeWriter>;

/// Connects a fresh client to a server wrapping `dispatcher`.
#[must_use]
pub fn in_process(dispatcher: Dispatcher) -> (InProcessServer, InProcessClient) {
    let (client_end, server_end) = tokio::io::duplex(PIPE_CAPACITY);
    let (server_read, server_write) = tokio::io::split(server_end);
    let (client_read, client_write) = tokio::io::split(client_end);

    let server = McpServer::with_transport(
        dispatcher,
        Transport::new(BufReader::new(server_read), server_write),
    );
    let client = McpClient::new(Transport::new(BufReader::new(client_read), client_write));
    (server, client)
}

/// A JSON-RPC client session.
pub struct McpClient<R, W> {
    transport: Transport<R, W>,
    next_id: i64,
}

impl<R, W> McpClient<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a client over `transport`.
    #[must_use]
    pub const fn new(transport: Transport<R, W>) -> Self {
        Self {
            transport,
            next_id: 1,
        }
    }

    /// Performs the initialize handshake and sends `initialized`.
    ///
    /// Returns the server's initialize result.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] if the server negotiates a different
    /// protocol version, or any error from [`request`](Self::request).
    pub async fn initialize(&mut self, client_name: &str) -> Result<Value, ClientError> {
        let result = self
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": client_name,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                })),
            )
            .await?;

        let version = result.get("protocolVersion").and_then(Value::as_str);
        if version != Some(MCP_PROTOCOL_VERSION) {
            return Err(ClientError::Protocol {
                message: format!("unsupported protocol version: {version:?}"),
            });
        }

        self.transport
            .send(&OutgoingNotification::initialized())
            .await?;
        Ok(result)
    }

    /// Sends a request and waits for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rpc`] if the server answers with an error,
    /// [`ClientError::Closed`] on EOF, [`ClientError::Malformed`] for a
    /// line that is not a reply, or [`ClientError::Protocol`] if the reply
    /// is not UTF-8 or answers a different request.
    pub async fn request(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, ClientError> {
        let id = RequestId::Number(self.next_id);
        self.next_id += 1;

        tracing::trace!(%id, method, "Sending request");
        self.transport
            .send(&OutgoingRequest::new(id.clone(), method, params))
            .await?;

        let line = loop {
            let line = self
                .transport
                .recv()
                .await?
                .ok_or(ClientError::Closed)?
                .map_err(|e| ClientError::Protocol {
                    message: format!("reply is not UTF-8: {e}"),
                })?;
            if !line.trim().is_empty() {
                break line;
            }
        };

        let reply = parse_reply(&line).map_err(ClientError::Malformed)?;
        if let Some(reply_id) = &reply.id {
            if *reply_id != id {
                return Err(ClientError::Protocol {
                    message: format!("expected reply to {id}, got reply to {reply_id}"),
                });
            }
        }

        reply.into_result().map_err(|e| ClientError::Rpc {
            code: e.code,
            message: e.message,
        })
    }

    /// Sends a notification.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if writing fails.
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        self.transport
            .send(&OutgoingNotification::new(method, params))
            .await?;
        Ok(())
    }

    /// Lists the server's tools.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn list_tools(&mut self) -> Result<Vec<Value>, ClientError> {
        let result = self.request("tools/list", None).await?;
        take_array(result, "tools")
    }

    /// Calls a tool and returns its result object.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value, ClientError> {
        self.request(
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
        .await
    }

    /// Lists the server's resources.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn list_resources(&mut self) -> Result<Vec<Value>, ClientError> {
        let result = self.request("resources/list", None).await?;
        take_array(result, "resources")
    }

    /// Reads a resource and returns its result object.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn read_resource(&mut self, uri: &str) -> Result<Value, ClientError> {
        self.request("resources/read", Some(json!({ "uri": uri })))
            .await
    }

    /// Lists the server's prompts.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn list_prompts(&mut self) -> Result<Vec<Value>, ClientError> {
        let result = self.request("prompts/list", None).await?;
        take_array(result, "prompts")
    }

    /// Renders a prompt and returns its result object.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_prompt(&mut self, name: &str, arguments: Value) -> Result<Value, ClientError> {
        self.request(
            "prompts/get",
            Some(json!({ "name": name, "arguments": arguments })),
        )
        .await
    }

    /// Closes the sending side so the server sees EOF.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the shutdown fails.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.transport.close().await?;
        Ok(())
    }
}

fn take_array(mut result: Value, key: &str) -> Result<Vec<Value>, ClientError> {
    match result.get_mut(key).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(ClientError::Protocol {
            message: format!("reply is missing the '{key}' list"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::builder()
            .register_builtin_tools()
            .and_then(crate::mcp::dispatcher::DispatcherBuilder::register_builtin_prompts)
            .unwrap()
            .build()
    }

    #[test]
    fn take_array_requires_list() {
        assert_eq!(take_array(json!({"tools": [1]}), "tools").unwrap().len(), 1);
        assert!(matches!(
            take_array(json!({"tools": {}}), "tools"),
            Err(ClientError::Protocol { .. })
        ));
    }

    #[tokio::test]
    async fn handshake_then_call() {
        let (mut server, mut client) = in_process(dispatcher());

        let (served, outcome) = tokio::join!(server.serve(), async {
            let init = client.initialize("unit-test").await?;
            let tools = client.list_tools().await?;
            let added = client
                .call_tool("add_task", json!({"title": "pipe"}))
                .await?;
            client.close().await?;
            Ok::<_, ClientError>((init, tools, added))
        });

        served.unwrap();
        let (init, tools, added) = outcome.unwrap();
        assert_eq!(init["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(tools.len(), 6);
        assert_eq!(added["content"][0]["text"], "Task 'pipe' added with ID 1");
        assert_eq!(server.dispatcher().store().len(), 1);
    }

    #[tokio::test]
    async fn rpc_errors_surface_with_code() {
        let (mut server, mut client) = in_process(dispatcher());

        let (_, outcome) = tokio::join!(server.serve(), async {
            client.initialize("unit-test").await?;
            let err = client.get_prompt("missing", json!({})).await;
            client.close().await?;
            Ok::<_, ClientError>(err)
        });

        match outcome.unwrap() {
            Err(ClientError::Rpc { code, message }) => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Unknown prompt: missing");
            }
            other => panic!("expected RPC error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let (mut server, mut client) = in_process(dispatcher());

        let (_, outcome) = tokio::join!(server.serve(), async {
            client.initialize("unit-test").await?;
            client
                .notify("notifications/cancelled", Some(json!({"requestId": 1})))
                .await?;
            let pong = client.request("ping", None).await?;
            client.close().await?;
            Ok::<_, ClientError>(pong)
        });

        assert_eq!(outcome.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn closed_server_reports_closed() {
        let (server, mut client) = in_process(dispatcher());
        drop(server);
        let err = client.request("ping", None).await.unwrap_err();
        assert!(matches!(err, ClientError::Closed | ClientError::Io(_)));
    }
}

//! The MCP server: session lifecycle and request routing.
//!
//! A session starts with `initialize`, becomes usable once the client sends
//! `notifications/initialized`, and ends at EOF or on a termination signal.
//! In between, every `tools/*`, `resources/*` and `prompts/*` request is
//! turned into an [`Operation`] and handed to the [`Dispatcher`].
//!
//! Lines are handled strictly one at a time: a request is read, dispatched
//! to completion and answered before the next line is read.

use std::future::Future;
use std::io;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader, Stdin, Stdout};

use crate::mcp::dispatcher::{Dispatcher, Operation};
use crate::mcp::protocol::{
    parse_message, ErrorCode, IncomingMessage, JsonRpcError, JsonRpcErrorData,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId, MCP_PROTOCOL_VERSION,
};
use crate::mcp::transport::Transport;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ListCapability,
    /// Resource-related capabilities.
    pub resources: ResourceCapability,
    /// Prompt-related capabilities.
    pub prompts: ListCapability,
}

/// Capabilities of a listable collection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCapability {
    /// Whether the list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

/// Resource-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCapability {
    /// Whether clients may subscribe to resource updates.
    #[serde(skip_serializing_if = "is_false")]
    pub subscribe: bool,
    /// Whether the resource list can change during the session.
    #[serde(skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl ServerInfo {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Parameters for resources/read request.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceReadParams {
    /// URI of the resource to read.
    pub uri: String,
}

/// Parameters for prompts/get request.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptGetParams {
    /// Name of the prompt to render.
    pub name: String,
    /// Prompt arguments.
    #[serde(default)]
    pub arguments: Value,
}

/// The MCP learning server.
pub struct McpServer<R = BufReader<Stdin>, W = Stdout> {
    /// Current server state.
    state: ServerState,
    /// The transport layer.
    transport: Transport<R, W>,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
    /// Registries and task store.
    dispatcher: Dispatcher,
}

impl McpServer {
    /// Creates a server speaking over stdin/stdout.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_transport(dispatcher, Transport::stdio())
    }
}

impl<R, W> McpServer<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a server over an arbitrary transport.
    #[must_use]
    pub const fn with_transport(dispatcher: Dispatcher, transport: Transport<R, W>) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            transport,
            protocol_version: None,
            dispatcher,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the negotiated protocol version, once initialised.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Returns the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serves until the peer closes the transport or the process is asked
    /// to stop (SIGINT/SIGTERM, or Ctrl+C on Windows).
    ///
    /// # Errors
    ///
    /// Returns an error if a signal handler cannot be installed or transport
    /// I/O fails.
    pub async fn run(&mut self) -> io::Result<()> {
        let signal = shutdown_signal()?;
        self.serve_until(signal).await
    }

    /// Serves until the peer closes the transport.
    ///
    /// Installs no signal handlers, so any number of in-process sessions can
    /// run side by side.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve(&mut self) -> io::Result<()> {
        self.serve_until(std::future::pending()).await
    }

    async fn serve_until(&mut self, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        tokio::pin!(shutdown);

        while self.state != ServerState::ShuttingDown {
            tokio::select! {
                () = &mut shutdown => {
                    self.state = ServerState::ShuttingDown;
                }
                line = self.transport.recv() => match line? {
                    None => {
                        tracing::info!("Transport closed, shutting down");
                        self.state = ServerState::ShuttingDown;
                    }
                    Some(Ok(line)) if line.trim().is_empty() => {}
                    Some(Ok(line)) => self.handle_line(&line).await?,
                    Some(Err(error)) => {
                        tracing::warn!(%error, "Rejected line that is not UTF-8");
                        self.transport.send(&JsonRpcError::parse_error()).await?;
                    }
                },
            }
        }
        Ok(())
    }

    /// Parses and answers one line. Notifications get no reply.
    async fn handle_line(&mut self, line: &str) -> io::Result<()> {
        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => self.handle_request(req).await,
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(code = error.error.code, "Rejected malformed message");
                self.transport.send(&error).await
            }
        }
    }

    /// Handles an incoming request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> io::Result<()> {
        tracing::debug!(method = %req.method, id = %req.id, "Request received");

        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "ping" => Ok(Self::handle_ping(&req)),
            method => match Self::parse_operation(&req) {
                Some(operation) => self.handle_operation(&req.id, operation).await,
                None => Err(JsonRpcError::method_not_found(req.id.clone(), method)),
            },
        };

        match response {
            Ok(resp) => self.transport.send(&resp).await,
            Err(error) => self.transport.send(&error).await,
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            tracing::info!("Client initialised");
            self.state = ServerState::Running;
        } else {
            tracing::debug!(method = %notif.method, "Ignoring notification");
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Server already initialised",
                ),
            ));
        }

        let params: InitializeParams = parse_params(req, "initialize")?;
        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                version = client.version.as_deref().unwrap_or("unknown"),
                requested = %params.protocol_version,
                "Initialising session"
            );
        }

        let negotiated_version = MCP_PROTOCOL_VERSION.to_string();

        self.protocol_version = Some(negotiated_version.clone());
        self.state = ServerState::Initialising;

        let result = json!({
            "protocolVersion": negotiated_version,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::named(self.dispatcher.server_name()),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Maps a request onto a dispatcher operation.
    ///
    /// Returns `None` for methods the dispatcher does not handle.
    fn parse_operation(req: &JsonRpcRequest) -> Option<Result<Operation, JsonRpcError>> {
        let operation = match req.method.as_str() {
            "tools/list" => Ok(Operation::ListTools),
            "tools/call" => {
                parse_params::<ToolCallParams>(req, "tool call").map(|p| Operation::CallTool {
                    name: p.name,
                    arguments: p.arguments,
                })
            }
            "resources/list" => Ok(Operation::ListResources),
            "resources/read" => parse_params::<ResourceReadParams>(req, "resource read")
                .map(|p| Operation::ReadResource { uri: p.uri }),
            "prompts/list" => Ok(Operation::ListPrompts),
            "prompts/get" => {
                parse_params::<PromptGetParams>(req, "prompt get").map(|p| Operation::GetPrompt {
                    name: p.name,
                    arguments: p.arguments,
                })
            }
            _ => return None,
        };
        Some(operation)
    }

    /// Routes a running-state operation through the dispatcher.
    async fn handle_operation(
        &mut self,
        id: &RequestId,
        operation: Result<Operation, JsonRpcError>,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(id)?;
        let operation = operation?;

        let result = self
            .dispatcher
            .dispatch(operation)
            .await
            .map_err(|e| e.to_jsonrpc(id.clone()))?;

        Ok(JsonRpcResponse::success(id.clone(), result))
    }

    /// Handles the ping request.
    fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::new(
                Some(id.clone()),
                JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server not initialised"),
            ));
        }
        Ok(())
    }
}

/// Deserialises a request's params, which must be present.
fn parse_params<T: DeserializeOwned>(req: &JsonRpcRequest, what: &str) -> Result<T, JsonRpcError> {
    req.params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| {
            JsonRpcError::invalid_params(req.id.clone(), format!("Invalid {what} params: {e}"))
        })?
        .ok_or_else(|| {
            JsonRpcError::invalid_params(req.id.clone(), format!("Missing {what} params"))
        })
}

/// Resolves when the process is asked to terminate.
#[cfg(unix)]
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
        }
    })
}

/// Resolves when the process is asked to terminate.
#[cfg(windows)]
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    })
}

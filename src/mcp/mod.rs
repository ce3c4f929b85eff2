//! Model Context Protocol (MCP) server implementation.
//!
//! Speaks MCP over JSON-RPC 2.0 to expose the learning server's tools,
//! resources and prompts. The server side runs over stdio; the client side
//! drives it in-process for the demo and the tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │  Transport  │───▶│   Server    │───▶│  Dispatcher  │     │
//! │   │   (stdio)   │    │ (lifecycle) │    │ (registries) │     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! │          │                  │                  │             │
//! │          ▼                  ▼                  ▼             │
//! │   ┌──────────────────────────────────────────────────┐       │
//! │   │               JSON-RPC Messages                  │       │
//! │   └──────────────────────────────────────────────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`client`] module drives the same protocol from the other side.
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod client;
pub mod dispatcher;
pub mod protocol;
pub mod schema;
pub mod server;
pub mod transport;

pub use client::McpClient;
pub use dispatcher::{Dispatcher, DispatcherBuilder, Operation};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::StdioTransport;

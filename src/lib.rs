//! mcp-learning-server: an educational Model Context Protocol server
//!
//! This library exposes the three core MCP concepts through a small,
//! self-contained server:
//!
//! - **Tools**: task management, a simulated weather lookup and a calculator
//! - **Resources**: the task database, markdown notes and system information
//! - **Prompts**: templates for task summaries, learning plans and concept
//!   explanations
//!
//! All requests go through a single [`mcp::Dispatcher`], which is assembled
//! once at startup and then shared by the stdio server and the in-process
//! demo client.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types
//! - [`mcp`]: MCP protocol, server, dispatcher and client
//! - [`tasks`]: In-memory task store
//! - [`tools`]: Tool registry and built-in tools
//! - [`resources`]: Resource registry and built-in resources
//! - [`prompts`]: Prompt registry and built-in prompts
//! - [`demo`]: Scripted and interactive client demo

pub mod config;
pub mod demo;
pub mod error;
pub mod mcp;
pub mod prompts;
pub mod resources;
pub mod tasks;
pub mod tools;

//! MCP (Model Context Protocol) client for mcpchat.
//!
//! Servers are child processes speaking newline-delimited JSON-RPC 2.0 over
//! stdio. Each one is initialized with a handshake, after which its tools and
//! resources are listed. Resources can be read back as plain text so they can
//! be spliced into a conversation.

pub mod client;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod manager;
mod transport;

pub use client::{McpClient, McpResourceContent, McpResourceInfo, McpToolInfo};
pub use config::{McpConfig, McpServerConfig};
pub use error::McpError;
pub use manager::{McpManager, ServerSummary};

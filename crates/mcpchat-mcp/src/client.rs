//! MCP client: manages one server connection.
//!
//! Handles the handshake (initialize + initialized notification), tool and
//! resource discovery, and reading resources as text.

use crate::config::McpServerConfig;
use crate::error::McpError;
use crate::transport::StdioTransport;
use serde::Deserialize;

/// MCP protocol version we support.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// A tool advertised by an MCP server.
#[derive(Debug, Clone)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A resource advertised by an MCP server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct McpResourceInfo {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
}

/// One item returned by `resources/read`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum McpResourceContent {
    Text {
        uri: String,
        text: String,
        #[serde(default, rename = "mimeType")]
        mime_type: Option<String>,
    },
    Blob {
        uri: String,
        blob: String,
        #[serde(default, rename = "mimeType")]
        mime_type: Option<String>,
    },
}

/// Client for a single MCP server.
pub struct McpClient {
    name: String,
    transport: StdioTransport,
    tools: Vec<McpToolInfo>,
    resources: Vec<McpResourceInfo>,
}

#[derive(Deserialize)]
struct ToolsListResult {
    #[serde(default)]
    tools: Vec<ToolEntry>,
}

#[derive(Deserialize)]
struct ToolEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_schema", rename = "inputSchema")]
    input_schema: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

#[derive(Deserialize)]
struct ResourcesListResult {
    #[serde(default)]
    resources: Vec<McpResourceInfo>,
}

#[derive(Deserialize)]
struct ResourceReadResult {
    #[serde(default)]
    contents: Vec<McpResourceContent>,
}

impl McpClient {
    /// Connect to an MCP server: spawn, handshake, discover tools and resources.
    pub async fn connect(
        name: impl Into<String>,
        config: &McpServerConfig,
    ) -> Result<Self, McpError> {
        let name = name.into();
        tracing::debug!("Starting MCP server '{name}': {}", config.command_line());
        let transport = StdioTransport::spawn(&name, config)?;

        let init_params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "mcpchat",
                "version": env!("CARGO_PKG_VERSION")
            }
        });
        transport
            .send_request("initialize", Some(init_params))
            .await?
            .into_result(&name)?;

        transport
            .send_notification("notifications/initialized", None)
            .await?;

        let tools_result = transport
            .send_request("tools/list", None)
            .await?
            .into_result(&name)?;
        let tools = parse_tools(tools_result)?;

        // Servers without resource support answer with "method not found"
        let resources = match transport
            .send_request("resources/list", None)
            .await?
            .into_result(&name)
        {
            Ok(result) => parse_resources(result)?,
            Err(McpError::JsonRpc { code, message, .. }) => {
                tracing::debug!("MCP server '{name}' lists no resources ({code}: {message})");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            "MCP server '{}' connected with {} tools and {} resources",
            name,
            tools.len(),
            resources.len()
        );

        Ok(Self {
            name,
            transport,
            tools,
            resources,
        })
    }

    /// Read a resource and return its raw contents.
    pub async fn read_resource(&self, uri: &str) -> Result<Vec<McpResourceContent>, McpError> {
        let result = self
            .transport
            .send_request("resources/read", Some(serde_json::json!({ "uri": uri })))
            .await?
            .into_result(&self.name)?;

        let read: ResourceReadResult = serde_json::from_value(result).map_err(|e| {
            McpError::Protocol(format!("Failed to parse resources/read result: {e}"))
        })?;
        Ok(read.contents)
    }

    /// Read a resource as text. Binary items are skipped; text items are
    /// joined with newlines.
    pub async fn read_resource_text(&self, uri: &str) -> Result<String, McpError> {
        let contents = self.read_resource(uri).await?;
        if contents.is_empty() {
            return Err(McpError::ResourceNotFound {
                uri: uri.to_string(),
            });
        }
        Ok(contents_to_text(&contents))
    }

    pub fn tools(&self) -> &[McpToolInfo] {
        &self.tools
    }

    pub fn resources(&self) -> &[McpResourceInfo] {
        &self.resources
    }

    pub fn server_name(&self) -> &str {
        &self.name
    }

    /// Shut down the server connection.
    pub async fn shutdown(self) {
        self.transport.shutdown().await;
    }
}

fn parse_tools(result: serde_json::Value) -> Result<Vec<McpToolInfo>, McpError> {
    let list: ToolsListResult = serde_json::from_value(result)
        .map_err(|e| McpError::Protocol(format!("Failed to parse tools/list response: {e}")))?;
    Ok(list
        .tools
        .into_iter()
        .map(|t| McpToolInfo {
            name: t.name,
            description: t.description.unwrap_or_default(),
            input_schema: t.input_schema,
        })
        .collect())
}

fn parse_resources(result: serde_json::Value) -> Result<Vec<McpResourceInfo>, McpError> {
    let list: ResourcesListResult = serde_json::from_value(result).map_err(|e| {
        McpError::Protocol(format!("Failed to parse resources/list response: {e}"))
    })?;
    Ok(list.resources)
}

fn contents_to_text(contents: &[McpResourceContent]) -> String {
    contents
        .iter()
        .filter_map(|item| match item {
            McpResourceContent::Text { text, .. } => Some(text.as_str()),
            McpResourceContent::Blob { uri, .. } => {
                tracing::debug!("Skipping binary resource content for {uri}");
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! MCP manager: owns every connected server for the lifetime of a session.

use crate::client::{McpClient, McpResourceInfo};
use crate::config::McpServerConfig;
use std::sync::Arc;

/// Summary line for one connected server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSummary {
    pub name: String,
    pub tools: usize,
    pub resources: usize,
}

/// Manages connections to multiple MCP servers, in connection order.
#[derive(Default)]
pub struct McpManager {
    clients: Vec<Arc<McpClient>>,
}

impl McpManager {
    /// Start the given servers in order.
    pub async fn start(servers: &[(String, McpServerConfig)]) -> Self {
        let mut manager = Self::default();
        manager.connect_all(servers).await;
        manager
    }

    /// Connect more servers after the ones already held.
    ///
    /// Servers that fail to start are logged and skipped; the session
    /// continues with whatever servers are available.
    pub async fn connect_all(&mut self, servers: &[(String, McpServerConfig)]) {
        for (name, server_config) in servers {
            match McpClient::connect(name.clone(), server_config).await {
                Ok(client) => self.add(client),
                Err(e) => {
                    tracing::warn!("Failed to start MCP server '{}': {}", name, e);
                    eprintln!("Warning: MCP server '{name}' failed to start: {e}");
                }
            }
        }
    }

    /// Take ownership of an already-connected client.
    pub fn add(&mut self, client: McpClient) {
        self.clients.push(Arc::new(client));
    }

    /// Look up a connected server by name.
    pub fn client(&self, name: &str) -> Option<Arc<McpClient>> {
        self.clients
            .iter()
            .find(|c| c.server_name() == name)
            .cloned()
    }

    /// Every advertised resource, paired with the client that serves it.
    pub fn resources(&self) -> Vec<(Arc<McpClient>, McpResourceInfo)> {
        self.clients
            .iter()
            .flat_map(|client| {
                client
                    .resources()
                    .iter()
                    .map(|resource| (Arc::clone(client), resource.clone()))
            })
            .collect()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Connected servers with their tool and resource counts.
    pub fn server_summary(&self) -> Vec<ServerSummary> {
        self.clients
            .iter()
            .map(|c| ServerSummary {
                name: c.server_name().to_string(),
                tools: c.tools().len(),
                resources: c.resources().len(),
            })
            .collect()
    }

    /// Shut down all connected servers, last started first.
    pub async fn shutdown(self) {
        for client in self.clients.into_iter().rev() {
            match Arc::try_unwrap(client) {
                Ok(client) => client.shutdown().await,
                Err(client) => {
                    // Still shared; the child is killed when the last handle drops
                    tracing::debug!(
                        "MCP server '{}' still in use at shutdown",
                        client.server_name()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_list_starts_no_servers() {
        let manager = McpManager::start(&[]).await;
        assert_eq!(manager.client_count(), 0);
        assert!(manager.resources().is_empty());
        assert!(manager.server_summary().is_empty());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn failed_server_is_skipped() {
        let servers = vec![(
            "bad".to_string(),
            McpServerConfig {
                timeout_ms: 1000,
                ..McpServerConfig::new("nonexistent_command_xyz123", vec![])
            },
        )];
        let manager = McpManager::start(&servers).await;
        assert_eq!(manager.client_count(), 0);
        assert!(manager.client("bad").is_none());
        manager.shutdown().await;
    }
}

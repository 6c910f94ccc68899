//! Configuration types for MCP servers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

fn default_timeout() -> u64 {
    30000
}

/// MCP servers declared in the config file, keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, McpServerConfig>,
}

/// How to launch a single MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Command to run (e.g., "uv", "python").
    pub command: String,
    /// Arguments to pass to the command.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables to set for the server process.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Timeout for requests in milliseconds (default: 30000).
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl McpServerConfig {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: HashMap::new(),
            timeout_ms: default_timeout(),
        }
    }

    /// A Python server script, run through `uv run` or a bare `python`.
    pub fn python_script(script: impl Into<String>, use_uv: bool) -> Self {
        let script = script.into();
        if use_uv {
            Self::new("uv", vec!["run".to_string(), script])
        } else {
            Self::new("python", vec![script])
        }
    }

    /// Human-readable command line, for logs and `/servers`.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl McpConfig {
    /// Config-file servers in name order.
    pub fn named_servers(&self) -> Vec<(String, McpServerConfig)> {
        self.servers
            .iter()
            .map(|(name, config)| (name.clone(), config.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_server() {
        let toml_str = r#"
[servers.weather]
command = "uv"
args = ["run", "weather_server.py"]
"#;
        let config: McpConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.servers.len(), 1);
        let weather = &config.servers["weather"];
        assert_eq!(weather.command, "uv");
        assert_eq!(weather.args.len(), 2);
        assert_eq!(weather.timeout_ms, 30000);
    }

    #[test]
    fn parse_env_and_timeout() {
        let toml_str = r#"
[servers.github]
command = "npx"
args = ["-y", "@modelcontextprotocol/server-github"]
env = { GITHUB_TOKEN = "ghp_xxxx" }
timeout_ms = 60000
"#;
        let config: McpConfig = toml::from_str(toml_str).unwrap();
        let gh = &config.servers["github"];
        assert_eq!(gh.env["GITHUB_TOKEN"], "ghp_xxxx");
        assert_eq!(gh.timeout_ms, 60000);
    }

    #[test]
    fn named_servers_are_sorted() {
        let toml_str = r#"
[servers.zeta]
command = "z"

[servers.alpha]
command = "a"
"#;
        let config: McpConfig = toml::from_str(toml_str).unwrap();
        let names: Vec<String> = config.named_servers().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn python_script_with_and_without_uv() {
        let uv = McpServerConfig::python_script("mcp_server.py", true);
        assert_eq!(uv.command_line(), "uv run mcp_server.py");

        let plain = McpServerConfig::python_script("mcp_server.py", false);
        assert_eq!(plain.command, "python");
        assert_eq!(plain.args, vec!["mcp_server.py"]);
    }

    #[test]
    fn default_config_is_empty() {
        assert!(McpConfig::default().servers.is_empty());
    }
}

//! Layered configuration for mcpchat.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use mcpchat_mcp::{McpConfig, McpServerConfig};
use mcpchat_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default temperature for chat requests.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Default script for the document MCP server.
pub const DEFAULT_DOC_SERVER: &str = "mcp_server.py";

/// Which chat backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    OpenAi,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            other => Err(ConfigError::InvalidValue {
                key: "PROVIDER".into(),
                message: format!("must be 'claude' or 'openai', got '{other}'"),
            }),
        }
    }

    fn model_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_MODEL",
            ProviderKind::Claude => "CLAUDE_MODEL",
        }
    }

    fn key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Claude => "ANTHROPIC_API_KEY",
        }
    }

    fn base_url_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_BASE_URL",
            ProviderKind::Claude => "ANTHROPIC_BASE_URL",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => mcpchat_api::DEFAULT_OPENAI_BASE_URL,
            ProviderKind::Claude => mcpchat_api::DEFAULT_ANTHROPIC_BASE_URL,
        }
    }
}

/// Resolved configuration for an mcpchat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: String,
    pub api_base_url: String,
    /// Only sent to Anthropic-compatible backends.
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: Option<String>,
    pub use_uv: bool,
    pub doc_server: String,
    pub mcp: McpConfig,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    pub provider: Option<String>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    pub use_uv: Option<bool>,
    pub doc_server: Option<String>,
    #[serde(default)]
    pub openai: ProviderSettings,
    #[serde(default)]
    pub anthropic: ProviderSettings,
    #[serde(default)]
    pub mcp: McpConfig,
}

/// Per-provider section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    pub doc_server: Option<String>,
    /// Explicit config file; unlike the default location it must parse.
    pub config_file: Option<PathBuf>,
}

impl ChatConfig {
    /// Load configuration from CLI flags, the process environment and the
    /// config file.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (~/.mcpchat/config.toml or `--config`)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = match &overrides.config_file {
            Some(path) => read_settings_file(path)?,
            None => load_settings_file(&config_dir.join("config.toml")),
        };
        Self::resolve(overrides, settings, config_dir, |key| std::env::var(key).ok())
    }

    /// Apply precedence rules over already-loaded sources.
    pub fn resolve(
        overrides: CliOverrides,
        settings: SettingsFile,
        config_dir: PathBuf,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |key: &str| non_empty(env(key));

        let provider = match non_empty(overrides.provider)
            .or_else(|| env("PROVIDER"))
            .or(non_empty(settings.provider))
        {
            Some(value) => ProviderKind::parse(&value)?,
            None => ProviderKind::OpenAi,
        };

        let section = match provider {
            ProviderKind::OpenAi => settings.openai,
            ProviderKind::Claude => settings.anthropic,
        };

        let model = non_empty(overrides.model)
            .or_else(|| env(provider.model_var()))
            .or(non_empty(section.model))
            .ok_or_else(|| missing(provider.model_var()))?;

        let api_key = non_empty(overrides.api_key)
            .or_else(|| env(provider.key_var()))
            .or(non_empty(section.api_key))
            .ok_or_else(|| missing(provider.key_var()))?;

        let api_base_url = env(provider.base_url_var())
            .or(non_empty(section.base_url))
            .unwrap_or_else(|| provider.default_base_url().to_string());

        let max_tokens = section
            .max_tokens
            .unwrap_or(mcpchat_api::DEFAULT_MAX_TOKENS);

        let temperature = overrides
            .temperature
            .or(settings.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "temperature".into(),
                message: format!("must be between 0.0 and 2.0, got {temperature}"),
            });
        }

        let use_uv = match env("USE_UV") {
            Some(value) => value == "1",
            None => settings.use_uv.unwrap_or(false),
        };

        let doc_server = non_empty(overrides.doc_server)
            .or(non_empty(settings.doc_server))
            .unwrap_or_else(|| DEFAULT_DOC_SERVER.to_string());

        Ok(ChatConfig {
            provider,
            model,
            api_key,
            api_base_url,
            max_tokens,
            temperature,
            system_prompt: non_empty(overrides.system_prompt).or(non_empty(settings.system_prompt)),
            use_uv,
            doc_server,
            mcp: settings.mcp,
            config_dir,
        })
    }

    /// Launch command for the document server.
    pub fn doc_server_config(&self) -> McpServerConfig {
        McpServerConfig::python_script(&self.doc_server, self.use_uv)
    }

    /// Extra servers: one `uv run <script>` per script, then config-file servers.
    pub fn extra_servers(&self, scripts: &[String]) -> Vec<(String, McpServerConfig)> {
        scripts
            .iter()
            .enumerate()
            .map(|(i, script)| {
                (
                    format!("client_{i}_{script}"),
                    McpServerConfig::python_script(script, true),
                )
            })
            .chain(self.mcp.named_servers())
            .collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing(var: &str) -> ConfigError {
    ConfigError::MissingKey {
        key: format!("{var} cannot be empty (set it in the environment, .env or config.toml)"),
    }
}

/// Get the mcpchat config directory path (~/.mcpchat/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MCPCHAT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mcpchat")
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}

/// Read a settings file that the user asked for explicitly.
fn read_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

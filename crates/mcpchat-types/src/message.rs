//! Backend-neutral conversation model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Role of a conversation participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
}

/// One turn of a conversation as held by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub content: TurnContent,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<TurnContent>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text.into())
    }
}

/// Content carried by a turn.
///
/// Histories are usually built from plain strings, but block sequences (and
/// the occasional single block) show up when a history is loaded from JSON
/// produced by a richer provider. `Other` keeps anything else as raw JSON,
/// including single objects whose `type` is not a known block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
    Block(ContentBlock),
    Other(Value),
}

impl TurnContent {
    /// Classify raw JSON content without losing any of it.
    pub fn from_value(value: Value) -> Self {
        let parsed = match &value {
            Value::String(text) => Some(TurnContent::Text(text.clone())),
            Value::Array(_) => Vec::<ContentBlock>::deserialize(&value)
                .ok()
                .map(TurnContent::Blocks),
            Value::Object(map)
                if map
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(ContentBlock::is_known_type) =>
            {
                ContentBlock::deserialize(&value)
                    .ok()
                    .map(TurnContent::Block)
            }
            _ => None,
        };
        parsed.unwrap_or(TurnContent::Other(value))
    }
}

impl<'de> Deserialize<'de> for TurnContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(TurnContent::from_value)
    }
}

impl Default for TurnContent {
    fn default() -> Self {
        TurnContent::Text(String::new())
    }
}

impl From<String> for TurnContent {
    fn from(text: String) -> Self {
        TurnContent::Text(text)
    }
}

impl From<&str> for TurnContent {
    fn from(text: &str) -> Self {
        TurnContent::Text(text.to_string())
    }
}

impl From<Vec<ContentBlock>> for TurnContent {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        TurnContent::Blocks(blocks)
    }
}

/// A block of content within a turn.
///
/// Only `Text` is meaningful to the chat shim; the other variants exist so
/// histories from tool-capable providers still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    Thinking {
        thinking: String,
    },
    #[serde(other)]
    Unsupported,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Whether `kind` is the `type` tag of a variant other than `Unsupported`.
    pub fn is_known_type(kind: &str) -> bool {
        matches!(kind, "text" | "tool_use" | "tool_result" | "thinking")
    }
}

/// A text block of a normalized reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "text")]
pub struct TextBlock {
    pub text: String,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
}

/// Backend-neutral reply returned by a chat call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedReply {
    pub content: Vec<TextBlock>,
    pub stop_reason: StopReason,
}

impl NormalizedReply {
    /// A single-block reply that finished normally.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextBlock::new(text)],
            stop_reason: StopReason::EndTurn,
        }
    }

    /// All block texts joined by newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A tool definition a caller may offer to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Per-call options for a chat request. Not stored anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub system: Option<String>,
    pub temperature: f32,
    pub stop_sequences: Option<Vec<String>>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub thinking: bool,
    pub thinking_budget: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            system: None,
            temperature: 1.0,
            stop_sequences: None,
            tools: None,
            thinking: false,
            thinking_budget: 1024,
        }
    }
}

impl ChatOptions {
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = Some(stop);
        self
    }
}

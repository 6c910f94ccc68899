//! The provider shim: one `chat` surface over any [`ChatBackend`].

use crate::normalize::normalize;
use mcpchat_types::{
    ApiError, Capabilities, ChatBackend, ChatOptions, ChatRequest, NormalizedReply, Role, Turn,
    WireTurn,
};
use std::sync::Arc;

/// Something that can be appended to a history as a text turn.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageInput {
    Text(String),
    Reply(NormalizedReply),
}

impl MessageInput {
    fn into_text(self) -> String {
        match self {
            MessageInput::Text(text) => text,
            MessageInput::Reply(reply) => text_from_message(&reply),
        }
    }
}

impl From<&str> for MessageInput {
    fn from(text: &str) -> Self {
        MessageInput::Text(text.to_string())
    }
}

impl From<String> for MessageInput {
    fn from(text: String) -> Self {
        MessageInput::Text(text)
    }
}

impl From<NormalizedReply> for MessageInput {
    fn from(reply: NormalizedReply) -> Self {
        MessageInput::Reply(reply)
    }
}

impl From<&NormalizedReply> for MessageInput {
    fn from(reply: &NormalizedReply) -> Self {
        MessageInput::Reply(reply.clone())
    }
}

impl From<serde_json::Value> for MessageInput {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => MessageInput::Text(text),
            other => {
                tracing::warn!("Appending non-string message as its JSON text: {other}");
                MessageInput::Text(other.to_string())
            }
        }
    }
}

/// Join a reply's text blocks with newlines.
pub fn text_from_message(reply: &NormalizedReply) -> String {
    reply.joined_text()
}

/// Append a user turn to `history`.
pub fn add_user_message(history: &mut Vec<Turn>, message: impl Into<MessageInput>) {
    push_turn(history, Role::User, message.into());
}

/// Append an assistant turn to `history`.
pub fn add_assistant_message(history: &mut Vec<Turn>, message: impl Into<MessageInput>) {
    push_turn(history, Role::Assistant, message.into());
}

fn push_turn(history: &mut Vec<Turn>, role: Role, message: MessageInput) {
    history.push(Turn::new(role, message.into_text()));
}

/// Stateless chat front-end over a single backend and model.
///
/// Text only: see [`ProviderShim::capabilities`]. Tool definitions and
/// thinking flags in [`ChatOptions`] are accepted and ignored.
#[derive(Clone)]
pub struct ProviderShim {
    backend: Arc<dyn ChatBackend>,
    model: String,
}

impl ProviderShim {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Features this shim supports. Callers must check before relying on
    /// tool use or extended thinking.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::TEXT_ONLY
    }

    /// Build the outbound request for `history` without sending it.
    pub fn build_request(&self, history: &[Turn], options: &ChatOptions) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(system) = options.system.as_deref().filter(|s| !s.is_empty()) {
            messages.push(WireTurn::new(Role::System, system));
        }
        messages.extend(normalize(history));

        let stop = options
            .stop_sequences
            .as_ref()
            .filter(|stop| !stop.is_empty())
            .cloned();

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: options.temperature,
            stop,
        }
    }

    /// Send `history` to the backend and return the first choice as a reply.
    ///
    /// Backend errors are returned unchanged. A choice with no text becomes an
    /// empty reply; a response with no choices at all is malformed.
    pub async fn chat(
        &self,
        history: &[Turn],
        options: &ChatOptions,
    ) -> Result<NormalizedReply, ApiError> {
        self.log_unsupported(options);

        let request = self.build_request(history, options);
        tracing::debug!(
            backend = self.backend.name(),
            model = %self.model,
            turns = request.messages.len(),
            "sending chat request"
        );

        let response = self.backend.send_chat_request(&request).await?;
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            ApiError::MalformedResponse("response contained no choices".to_string())
        })?;

        Ok(NormalizedReply::from_text(
            choice.message.content.unwrap_or_default(),
        ))
    }

    fn log_unsupported(&self, options: &ChatOptions) {
        let caps = self.capabilities();
        if options.tools.as_ref().is_some_and(|t| !t.is_empty()) && !caps.tool_use {
            tracing::debug!(
                "{} backend does not support tool use; ignoring tools",
                self.backend.name()
            );
        }
        if options.thinking && !caps.extended_thinking {
            tracing::debug!(
                "{} backend does not support extended thinking; ignoring budget of {}",
                self.backend.name(),
                options.thinking_budget
            );
        }
    }
}

//! Anthropic-compatible Messages API backend.
//!
//! Translates the chat-completions shaped [`ChatRequest`] into a Messages
//! request and folds the content blocks of the answer back into a single
//! choice.

use crate::client::{HttpClient, credential_header};
use mcpchat_types::{
    ApiError, BackendFuture, ChatBackend, ChatRequest, ChatResponse, Choice, ChoiceMessage, Role,
};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// The default Anthropic API base URL.
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// The Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default `max_tokens`; the Messages API requires one on every request.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Backend for `POST /v1/messages`.
#[derive(Clone)]
pub struct AnthropicClient {
    client: HttpClient,
    api_key: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<MessageParam<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct MessageParam<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: HttpClient::new(base_url)?,
            api_key: api_key.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    async fn create_message(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", credential_header(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            reqwest::header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let body = to_messages_request(request, self.max_tokens);
        let response: MessagesResponse = self
            .client
            .post_json("/v1/messages", headers, &body)
            .await?;
        Ok(into_chat_response(response))
    }
}

impl ChatBackend for AnthropicClient {
    fn send_chat_request<'a>(&'a self, request: &'a ChatRequest) -> BackendFuture<'a> {
        Box::pin(self.create_message(request))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// System turns are not allowed inside `messages`; lift them into `system`.
/// Blank turns are rejected by the Messages API and are left out.
fn to_messages_request(request: &ChatRequest, max_tokens: u32) -> MessagesRequest<'_> {
    let (system_turns, turns): (Vec<_>, Vec<_>) = request
        .messages
        .iter()
        .partition(|turn| turn.role == Role::System);

    let system = if system_turns.is_empty() {
        None
    } else {
        Some(
            system_turns
                .iter()
                .map(|turn| turn.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    };

    MessagesRequest {
        model: &request.model,
        max_tokens,
        messages: turns
            .into_iter()
            .filter(|turn| {
                let blank = turn.content.trim().is_empty();
                if blank {
                    tracing::debug!("Skipping blank {:?} turn in Messages request", turn.role);
                }
                !blank
            })
            .map(|turn| MessageParam {
                role: turn.role,
                content: &turn.content,
            })
            .collect(),
        system,
        temperature: request.temperature,
        stop_sequences: request.stop.as_deref(),
    }
}

fn into_chat_response(response: MessagesResponse) -> ChatResponse {
    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(text),
            ResponseBlock::Other => None,
        })
        .collect();

    let content = if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    };

    ChatResponse {
        choices: vec![Choice {
            message: ChoiceMessage { content },
            finish_reason: response.stop_reason,
        }],
    }
}

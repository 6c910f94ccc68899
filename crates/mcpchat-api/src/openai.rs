//! OpenAI chat-completions backend.

use crate::client::{HttpClient, credential_header};
use mcpchat_types::{ApiError, BackendFuture, ChatBackend, ChatRequest, ChatResponse};
use reqwest::header::{AUTHORIZATION, HeaderMap};

/// The default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Backend for `POST /v1/chat/completions`. The request body is the
/// [`ChatRequest`] as-is.
#[derive(Clone)]
pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: HttpClient::new(base_url)?,
            api_key: api_key.into(),
        })
    }

    async fn create_chat_completion(
        &self,
        request: &ChatRequest,
    ) -> Result<ChatResponse, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            credential_header(&format!("Bearer {}", self.api_key))?,
        );

        self.client
            .post_json("/v1/chat/completions", headers, request)
            .await
    }
}

impl ChatBackend for OpenAiClient {
    fn send_chat_request<'a>(&'a self, request: &'a ChatRequest) -> BackendFuture<'a> {
        Box::pin(self.create_chat_completion(request))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

//! Backend trait for chat-completion providers.

use crate::{ApiError, ChatRequest, ChatResponse};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by a backend call.
pub type BackendFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ChatResponse, ApiError>> + Send + 'a>>;

/// A chat-completions backend (OpenAI, Anthropic-compatible, or a test fake).
///
/// Dyn-compatible so the shim can hold an `Arc<dyn ChatBackend>`.
pub trait ChatBackend: Send + Sync {
    /// Issue exactly one request and return the raw response.
    fn send_chat_request<'a>(&'a self, request: &'a ChatRequest) -> BackendFuture<'a>;

    /// Backend name for logging/display (e.g., "openai").
    fn name(&self) -> &str;
}

/// Optional features a provider may support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub tool_use: bool,
    pub extended_thinking: bool,
}

impl Capabilities {
    /// Plain text in, plain text out.
    pub const TEXT_ONLY: Capabilities = Capabilities {
        tool_use: false,
        extended_thinking: false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn backend_is_dyn_compatible() {
        fn _accept(_b: &dyn ChatBackend) {}
    }

    #[test]
    fn arc_backend_is_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Arc<dyn ChatBackend>>();
    }

    #[test]
    fn text_only_has_no_features() {
        assert_eq!(Capabilities::TEXT_ONLY, Capabilities::default());
        assert!(!Capabilities::TEXT_ONLY.tool_use);
        assert!(!Capabilities::TEXT_ONLY.extended_thinking);
    }
}

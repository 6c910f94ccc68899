//! Provider shim and chat-completion backends for mcpchat.
//!
//! The shim flattens a backend-neutral history into plain-text wire turns,
//! issues one request through a [`ChatBackend`](mcpchat_types::ChatBackend)
//! and wraps the answer as a [`NormalizedReply`](mcpchat_types::NormalizedReply).

mod anthropic;
mod client;
mod normalize;
mod openai;
mod shim;

pub use anthropic::{AnthropicClient, DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_MAX_TOKENS};
pub use normalize::{flatten_content, normalize};
pub use openai::{DEFAULT_OPENAI_BASE_URL, OpenAiClient};
pub use shim::{
    MessageInput, ProviderShim, add_assistant_message, add_user_message, text_from_message,
};

//! Shared types and error hierarchy for mcpchat.

pub mod error;
pub mod message;
pub mod provider;
pub mod wire;

pub use error::{ApiError, ConfigError};
pub use message::*;
pub use provider::{BackendFuture, Capabilities, ChatBackend};
pub use wire::*;

//! Error hierarchy for mcpchat.

use thiserror::Error;

/// Errors raised by a chat backend. Returned to callers untranslated.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Server overloaded")]
    Overloaded,

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_message_includes_delay() {
        let err = ApiError::RateLimited {
            retry_after_ms: Some(2000),
        };
        assert_eq!(err.to_string(), "Rate limited (retry after Some(2000)ms)");
    }

    #[test]
    fn missing_key_message() {
        let err = ConfigError::MissingKey {
            key: "OPENAI_MODEL".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required configuration: OPENAI_MODEL"
        );
    }
}

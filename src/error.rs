use thiserror::Error;

/// Startup configuration failures. None of these are recoverable: the
/// process refuses to serve requests when one occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured (checked: secret store, OPENROUTER_API_KEY)")]
    MissingApiKey,

    #[error("invalid API key format: {0}")]
    InvalidApiKey(String),

    #[error("invalid completion endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("request timeout must be greater than zero")]
    InvalidTimeout,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// A failed completion attempt. Sessions turn these into a visible
/// assistant turn, so each variant's display text is user facing.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http {
        status: u16,
        body: String,
    },

    #[error("unexpected response: {0}")]
    Protocol(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("user message must not be empty")]
    EmptyUserTurn,

    #[error("a conversation holds exactly one system turn")]
    SystemTurnNotAllowed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_carries_status_and_body() {
        let e = CompletionError::Http { status: 502, body: "bad gateway".into() };
        assert_eq!(e.to_string(), "HTTP 502: bad gateway");
    }

    #[test]
    fn missing_key_mentions_env_var() {
        assert!(ConfigError::MissingApiKey.to_string().contains("OPENROUTER_API_KEY"));
    }
}

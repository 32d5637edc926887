pub mod openrouter;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use super::{ LlmConfig, DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL };
use self::openrouter::OpenRouterChatClient;
use crate::error::{ CompletionError, ConfigError };
use crate::models::chat::Turn;

/// Sends a whole conversation to a chat-completion endpoint and returns the
/// assistant's reply. One request per call, no retries.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError>;

    fn get_model(&self) -> String;
    fn get_endpoint(&self) -> String;
    fn get_timeout(&self) -> Duration;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ConfigError> {
    let endpoint = config.base_url.as_deref().unwrap_or(DEFAULT_CHAT_URL);
    let endpoint = Url::parse(endpoint).map_err(|e|
        ConfigError::InvalidEndpoint(format!("'{}': {}", endpoint, e))
    )?;
    let model = config.completion_model
        .clone()
        .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

    let client = OpenRouterChatClient::configure(&config.api_key, endpoint, model, config.timeout)?;
    Ok(Arc::new(client))
}

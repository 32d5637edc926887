use async_trait::async_trait;
use log::{ debug, info, warn };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::time::{ Duration, Instant };
use url::Url;

use super::ChatClient;
use crate::error::{ CompletionError, ConfigError };
use crate::models::chat::Turn;

/// Client for OpenAI-style `/chat/completions` endpoints such as OpenRouter.
/// Configuration is fixed at construction.
pub struct OpenRouterChatClient {
    http: HttpClient,
    model: String,
    endpoint: Url,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenRouterChatClient {
    pub fn configure(
        api_key: &str,
        endpoint: Url,
        model: impl Into<String>,
        timeout: Duration
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(
                ConfigError::InvalidEndpoint(format!("unsupported scheme '{}'", endpoint.scheme()))
            );
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
            ConfigError::InvalidApiKey(e.to_string())
        )?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            model: model.into(),
            endpoint,
            timeout,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Transport(format!("timed out after {}s", self.timeout.as_secs_f32()))
        } else {
            CompletionError::Transport(e.to_string())
        }
    }
}

fn extract_content(body: &str) -> Result<String, CompletionError> {
    let parsed: ChatResponse = serde_json
        ::from_str(body)
        .map_err(|e| CompletionError::Protocol(format!("malformed response body: {}", e)))?;
    parsed.choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::Protocol("response contained no choices".to_string()))?
        .message.content.ok_or_else(||
            CompletionError::Protocol("choices[0].message.content missing".to_string())
        )
}

#[async_trait]
impl ChatClient for OpenRouterChatClient {
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError> {
        let req = ChatRequest {
            model: &self.model,
            messages: turns,
        };

        debug!("POST {} with {} turns", self.endpoint, turns.len());
        let started = Instant::now();
        let resp = self.http
            .post(self.endpoint.clone())
            .json(&req)
            .send().await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Completion endpoint returned {}", status);
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Http { status: status.as_u16(), body });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        let content = extract_content(&body)?;
        info!(
            "Completion from {} in {}ms ({} chars)",
            self.model,
            started.elapsed().as_millis(),
            content.len()
        );
        Ok(content)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_endpoint(&self) -> String {
        self.endpoint.to_string()
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }
}

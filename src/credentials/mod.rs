use crate::error::ConfigError;
use log::{ debug, info, warn };
use serde_json::Value as JsonValue;
use std::fs;
use std::path::PathBuf;

pub const API_KEY_NAME: &str = "OPENROUTER_API_KEY";

/// A single source of the API key. Resolvers are tried in order and the
/// first non-empty value wins.
pub trait CredentialResolver: Send + Sync {
    fn name(&self) -> &str;
    fn try_resolve(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub api_key: String,
    pub source: String,
}

/// Reads `{"OPENROUTER_API_KEY": "..."}` from a JSON secrets file managed by
/// the deployment. A missing file is not an error.
pub struct SecretStoreResolver {
    path: PathBuf,
    key: String,
}

impl SecretStoreResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), key: API_KEY_NAME.to_string() }
    }
}

impl CredentialResolver for SecretStoreResolver {
    fn name(&self) -> &str {
        "secret store"
    }

    fn try_resolve(&self) -> Option<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!("Secret store '{}' not readable: {}", self.path.display(), e);
                return None;
            }
        };
        let secrets: JsonValue = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse secret store '{}': {}", self.path.display(), e);
                return None;
            }
        };
        secrets
            .get(&self.key)
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }
}

pub struct EnvResolver {
    var: String,
}

impl EnvResolver {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvResolver {
    fn default() -> Self {
        Self::new(API_KEY_NAME)
    }
}

impl CredentialResolver for EnvResolver {
    fn name(&self) -> &str {
        "environment"
    }

    fn try_resolve(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The standard chain: secret store first, then the environment.
pub fn default_resolvers(secrets_path: &str) -> Vec<Box<dyn CredentialResolver>> {
    vec![Box::new(SecretStoreResolver::new(secrets_path)), Box::new(EnvResolver::default())]
}

pub fn resolve_api_key(
    resolvers: &[Box<dyn CredentialResolver>]
) -> Result<ResolvedCredential, ConfigError> {
    for resolver in resolvers {
        if let Some(api_key) = resolver.try_resolve() {
            info!("API key resolved from {}", resolver.name());
            return Ok(ResolvedCredential {
                api_key,
                source: resolver.name().to_string(),
            });
        }
        debug!("No API key from {}", resolver.name());
    }
    Err(ConfigError::MissingApiKey)
}

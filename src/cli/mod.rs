use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Chat-completion endpoint URL.
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://openrouter.ai/api/v1/chat/completions")]
    pub chat_base_url: String,

    /// Model name sent with every completion request (e.g., openai/gpt-4o)
    #[arg(long, env = "CHAT_MODEL", default_value = "openai/gpt-4o")]
    pub chat_model: String,

    /// Upper bound in seconds on a single completion request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout_secs: u64,

    /// System instruction that opens every conversation.
    #[arg(long, env = "SYSTEM_PROMPT", default_value = "You are a helpful assistant.")]
    pub system_prompt: String,

    /// JSON secrets file checked for OPENROUTER_API_KEY before the environment.
    #[arg(long, env = "SECRETS_PATH", default_value = "secrets.json")]
    pub secrets_path: String,

    // --- Server Args ---
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional API Key required for clients to connect to the WebSocket server. If set, clients must provide this key.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Port for the HTTP status API. Disabled when unset.
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,
}

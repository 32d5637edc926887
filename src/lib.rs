pub mod cli;
pub mod conversation;
pub mod credentials;
pub mod error;
pub mod llm;
pub mod models;
pub mod server;
pub mod session;

use cli::Args;
use credentials::{ default_resolvers, resolve_api_key };
use llm::chat::new_client;
use llm::LlmConfig;
use log::info;
use server::{ AppState, Server };
use std::error::Error;
use std::time::Duration;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HTTP Status Port: {:?}", args.http_port);
    info!("Chat Endpoint: {}", args.chat_base_url);
    info!("Chat Model: {}", args.chat_model);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("Secrets Path: {}", args.secrets_path);
    info!("-------------------------");

    // Fail closed: nothing is served without a key.
    let credential = resolve_api_key(&default_resolvers(&args.secrets_path))?;

    let chat_config = LlmConfig {
        api_key: credential.api_key,
        completion_model: Some(args.chat_model.clone()),
        base_url: Some(args.chat_base_url.clone()),
        timeout: Duration::from_secs(args.request_timeout_secs),
    };
    let client = new_client(&chat_config)?;

    let state = AppState {
        client,
        system_prompt: args.system_prompt.as_str().into(),
        credential_source: credential.source,
        server_api_key: args.server_api_key.clone(),
    };

    info!("Starting server on: {}", args.server_addr);
    let server = Server::new(args.server_addr.clone(), args.http_port, state);
    server.run().await?;

    Ok(())
}

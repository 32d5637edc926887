pub mod api;
pub mod websocket;

use crate::llm::chat::ChatClient;
use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Read-only state shared by every connection. Conversations are not kept
/// here; each WebSocket connection owns its own session.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ChatClient>,
    pub system_prompt: Arc<str>,
    pub credential_source: String,
    pub server_api_key: Option<String>,
}

pub struct Server {
    addr: String,
    http_port: Option<u16>,
    state: AppState,
}

impl Server {
    pub fn new(addr: String, http_port: Option<u16>, mut state: AppState) -> Self {
        state.server_api_key = state.server_api_key.filter(|k| !k.trim().is_empty());

        if state.server_api_key.is_some() {
            info!("Server configured with API Key authentication.");
        } else {
            warn!("Server configured WITHOUT API Key authentication. Connections are open.");
        }

        Self { addr, http_port, state }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(http_port) = self.http_port {
            api::start_http_server(http_port, self.state.clone()).await?;
        }

        let listener = TcpListener::bind(&self.addr).await?;
        websocket::start_ws_server(listener, self.state.clone()).await
    }
}

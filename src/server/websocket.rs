use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::session::{ ChatSession, RenderSink, SessionError };
use crate::models::chat::Turn;
use super::AppState;
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::SplitSink;
use futures::{ SinkExt, StreamExt };
use sha2::{ Digest, Sha256 };
use url::form_urlencoded;
use log::{ info, warn, error, debug };
use std::error::Error;
use std::net::SocketAddr;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ Request, Response };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::http::response::Response as HttpResponse;
use tokio_tungstenite::{ tungstenite::protocol::Message, WebSocketStream };
use uuid::Uuid;

const MAX_MESSAGE_SIZE: usize = 1 * 1024 * 1024;

type WsSink<S> = SplitSink<WebSocketStream<S>, Message>;

struct WsRenderSink<'a, S> {
    tx: &'a mut WsSink<S>,
}

#[async_trait]
impl<'a, S> RenderSink for WsRenderSink<'a, S> where S: AsyncRead + AsyncWrite + Unpin + Send {
    async fn render(
        &mut self,
        turns: &[Turn],
        pending: bool
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let msg = ServerMessage::Render {
            turns: turns.to_vec(),
            pending,
            timestamp: Utc::now().timestamp(),
        };
        self.tx.send(Message::Text(serde_json::to_string(&msg)?)).await?;
        Ok(())
    }
}

async fn send_error<S>(tx: &mut WsSink<S>, message: String) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin
{
    let json = serde_json::to_string(&(ServerMessage::Error { message }))?;
    tx.send(Message::Text(json)).await?;
    Ok(())
}

pub async fn start_ws_server(
    listener: TcpListener,
    state: AppState
) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("WS server listening on: {}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await?;
        info!("Incoming connection from: {}", peer);
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = process_connection(peer, stream, state).await {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

fn provided_api_key(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if from_header.is_some() {
        return from_header;
    }
    let query = req.uri().query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| *k == "api_key")
        .map(|(_, v)| v.into_owned())
}

/// Compares fixed-length digests so the check does not leak how much of the
/// key matched.
fn api_key_matches(provided: Option<&str>, required: &str) -> bool {
    match provided {
        Some(provided) => Sha256::digest(provided.as_bytes()) == Sha256::digest(required.as_bytes()),
        None => false,
    }
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    state: AppState
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let required_api_key = state.server_api_key.clone();
    let auth_callback = |
        req: &Request,
        response: Response
    | -> Result<Response, HttpResponse<Option<String>>> {
        let Some(required) = required_api_key.as_deref() else {
            debug!("{} no API key required", peer);
            return Ok(response);
        };
        if !api_key_matches(provided_api_key(req).as_deref(), required) {
            warn!("{}: bad or missing API key", peer);
            let mut resp = HttpResponse::new(Some("Unauthorized".to_string()));
            *resp.status_mut() = StatusCode::UNAUTHORIZED;
            return Err(resp);
        }
        info!("{} authenticated", peer);
        Ok(response)
    };

    match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => {
            handle_connection(peer, ws, state).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

pub async fn handle_connection<S>(peer: SocketAddr, websocket: WebSocketStream<S>, state: AppState)
    where S: AsyncRead + AsyncWrite + Unpin + Send
{
    let (mut tx, mut rx) = websocket.split();
    let mut session = ChatSession::new(
        Uuid::new_v4().to_string(),
        &state.system_prompt,
        state.client.clone()
    );
    info!("Assigned session {} to {}", session.id(), peer);

    while let Some(msg) = rx.next().await {
        let message = match msg {
            Ok(m) => m,
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => {
                info!("WebSocket connection closed for {}", peer);
                break;
            }
            Err(e) => {
                error!("Error receiving message from {}: {}", peer, e);
                break;
            }
        };

        if message.len() > MAX_MESSAGE_SIZE {
            warn!("Message from {} exceeds size limit ({} > {})", peer, message.len(), MAX_MESSAGE_SIZE);
            let _ = send_error(&mut tx, "Message too large".to_string()).await;
            break;
        }

        match message {
            Message::Text(text) => {
                let result = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Chat { content }) => {
                        let mut sink = WsRenderSink { tx: &mut tx };
                        session.on_user_submit(&content, &mut sink).await
                    }
                    Ok(ClientMessage::Reset) => {
                        let mut sink = WsRenderSink { tx: &mut tx };
                        session.on_reset_requested(&mut sink).await
                    }
                    Err(e) => {
                        error!("Failed to parse message from {}: {}", peer, e);
                        if send_error(&mut tx, format!("Failed to parse message: {}", e)).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                match result {
                    Ok(()) => {}
                    Err(SessionError::Conversation(e)) => {
                        warn!("Rejected message from {}: {}", peer, e);
                        if send_error(&mut tx, e.to_string()).await.is_err() {
                            break;
                        }
                    }
                    Err(e @ SessionError::Render(_)) => {
                        error!("Error sending to {}: {}", peer, e);
                        break;
                    }
                }
            }
            Message::Close(_) => {
                info!("Received close frame from {}", peer);
                break;
            }
            Message::Ping(ping_data) => {
                if tx.send(Message::Pong(ping_data)).await.is_err() {
                    error!("Failed to send pong to {}", peer);
                    break;
                }
            }
            Message::Binary(_) => {
                warn!("Ignoring binary message from {}", peer);
            }
            Message::Pong(_) | Message::Frame(_) => {}
        }
    }
    info!("WebSocket connection closed for {} (session {})", peer, session.id());
}

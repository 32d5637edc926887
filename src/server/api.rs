use super::AppState;
use std::error::Error;
use std::net::SocketAddr;
use axum::{ routing::get, Router, extract::State, Json };
use serde::Serialize;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

#[derive(Serialize, Debug, PartialEq)]
pub struct StatusResponse {
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub credential_source: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    http_port: u16,
    state: AppState
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP status server on: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = router(state);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
            error!("HTTP server error: {}", e);
        }
    });

    Ok(())
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        model: state.client.get_model(),
        endpoint: state.client.get_endpoint(),
        timeout_secs: state.client.get_timeout().as_secs(),
        credential_source: state.credential_source.clone(),
    })
}

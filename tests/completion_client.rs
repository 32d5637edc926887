use std::net::SocketAddr;
use std::sync::{ Arc, Mutex };
use std::time::{ Duration, Instant };

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{ HeaderMap, StatusCode };
use axum::response::IntoResponse;
use axum::routing::post;
use openrouter_chat::error::{ CompletionError, ConfigError };
use openrouter_chat::llm::chat::openrouter::OpenRouterChatClient;
use openrouter_chat::llm::chat::{ new_client, ChatClient };
use openrouter_chat::llm::LlmConfig;
use openrouter_chat::models::chat::Turn;
use serde_json::{ Value, json };
use tokio::net::TcpListener;
use url::Url;

const ROUTE: &str = "/api/v1/chat/completions";

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock endpoint");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock endpoint");
    });
    addr
}

fn client_for(addr: SocketAddr, timeout: Duration) -> OpenRouterChatClient {
    let url = Url::parse(&format!("http://{}{}", addr, ROUTE)).unwrap();
    OpenRouterChatClient::configure("sk-test", url, "openai/gpt-4o", timeout).expect("configure")
}

fn conversation() -> Vec<Turn> {
    vec![Turn::system("You are a helpful assistant."), Turn::user("hello")]
}

async fn reply_hi(State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    captured.requests.lock().unwrap().push((headers, body));
    Json(json!({ "choices": [{ "message": { "role": "assistant", "content": "hi" } }] }))
}

#[tokio::test]
async fn success_returns_first_choice_content() {
    let captured = Captured::default();
    let app = Router::new().route(ROUTE, post(reply_hi)).with_state(captured.clone());
    let client = client_for(spawn(app).await, Duration::from_secs(5));

    let reply = client.complete(&conversation()).await.expect("completion");
    assert_eq!(reply, "hi");

    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (headers, body) = &requests[0];
    assert_eq!(headers.get("authorization").unwrap(), "Bearer sk-test");
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(
        body,
        &json!({
            "model": "openai/gpt-4o",
            "messages": [
                { "role": "system", "content": "You are a helpful assistant." },
                { "role": "user", "content": "hello" }
            ]
        })
    );
}

#[tokio::test]
async fn server_error_maps_to_http_variant() {
    let hits = Arc::new(Mutex::new(0u32));
    let counter = hits.clone();
    let app = Router::new().route(
        ROUTE,
        post(move || {
            let counter = counter.clone();
            async move {
                *counter.lock().unwrap() += 1;
                (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
            }
        })
    );
    let client = client_for(spawn(app).await, Duration::from_secs(5));

    match client.complete(&conversation()).await {
        Err(CompletionError::Http { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected Http error, got {:?}", other),
    }
    assert_eq!(*hits.lock().unwrap(), 1, "must not retry");
}

#[tokio::test]
async fn unauthorized_is_http_error() {
    let app = Router::new().route(
        ROUTE,
        post(|| async { (StatusCode::UNAUTHORIZED, r#"{"error":{"message":"No auth credentials found"}}"#) })
    );
    let client = client_for(spawn(app).await, Duration::from_secs(5));

    let err = client.complete(&conversation()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Http { status: 401, .. }));
    assert!(err.to_string().contains("No auth credentials found"));
}

#[tokio::test]
async fn slow_endpoint_times_out_as_transport_error() {
    let app = Router::new().route(
        ROUTE,
        post(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "too late"
        })
    );
    let client = client_for(spawn(app).await, Duration::from_millis(300));

    let started = Instant::now();
    let result = client.complete(&conversation()).await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(CompletionError::Transport(_))), "got {:?}", result);
    assert!(elapsed >= Duration::from_millis(250), "returned too early: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "timeout not enforced: {:?}", elapsed);
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr, Duration::from_secs(5));
    let result = client.complete(&conversation()).await;
    assert!(matches!(result, Err(CompletionError::Transport(_))), "got {:?}", result);
}

#[tokio::test]
async fn missing_choices_is_protocol_error() {
    let app = Router::new().route(ROUTE, post(|| async { Json(json!({ "id": "gen-1", "object": "chat.completion" })) }));
    let client = client_for(spawn(app).await, Duration::from_secs(5));

    let result = client.complete(&conversation()).await;
    assert!(matches!(result, Err(CompletionError::Protocol(_))), "got {:?}", result);
}

#[tokio::test]
async fn non_json_body_is_protocol_error() {
    let app = Router::new().route(ROUTE, post(|| async { "<html>gateway</html>" }));
    let client = client_for(spawn(app).await, Duration::from_secs(5));

    let result = client.complete(&conversation()).await;
    assert!(matches!(result, Err(CompletionError::Protocol(_))), "got {:?}", result);
}

#[tokio::test]
async fn empty_key_fails_before_any_request() {
    let captured = Captured::default();
    let app = Router::new().route(ROUTE, post(reply_hi)).with_state(captured.clone());
    let addr = spawn(app).await;

    let config = LlmConfig {
        api_key: String::new(),
        base_url: Some(format!("http://{}{}", addr, ROUTE)),
        ..LlmConfig::default()
    };
    assert!(matches!(new_client(&config), Err(ConfigError::MissingApiKey)));
    assert!(captured.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn factory_applies_defaults_and_rejects_bad_urls() {
    let config = LlmConfig { api_key: "sk".into(), ..LlmConfig::default() };
    let client = new_client(&config).expect("default client");
    assert_eq!(client.get_model(), "openai/gpt-4o");
    assert_eq!(client.get_endpoint(), "https://openrouter.ai/api/v1/chat/completions");
    assert_eq!(client.get_timeout(), Duration::from_secs(30));

    let bad = LlmConfig { api_key: "sk".into(), base_url: Some("not a url".into()), ..LlmConfig::default() };
    assert!(matches!(new_client(&bad), Err(ConfigError::InvalidEndpoint(_))));
}

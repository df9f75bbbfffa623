//! The HTTP completion driver against a local OpenAI-compatible server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use doc_insights::insights::{InsightError, InsightRequest, InsightRequester};
use doc_insights::llm::{ChatCompletionsDriver, LlmSettings, ModelChoice};
use serde_json::{Value, json};

type Seen = Arc<Mutex<Vec<Value>>>;

/// Answers according to the bearer token it receives.
async fn chat_completions(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    seen.lock().unwrap().push(body.clone());

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();

    let error = |status: StatusCode, message: &str| {
        (
            status,
            Json(json!({"error": {"message": message, "type": "test"}})),
        )
            .into_response()
    };

    match token.as_str() {
        "sk-bad" => error(StatusCode::UNAUTHORIZED, "Incorrect API key provided"),
        "sk-busy" => error(StatusCode::TOO_MANY_REQUESTS, "You exceeded your current quota"),
        "sk-unknown-model" => error(StatusCode::NOT_FOUND, "The model `gpt-4` does not exist"),
        "sk-broken" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        "sk-empty" => Json(json!({"choices": []})).into_response(),
        "sk-slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"choices": []})).into_response()
        }
        _ => Json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "The conclusion is X."},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
    }
}

async fn spawn_server() -> (SocketAddr, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(Arc::clone(&seen));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

fn requester(addr: SocketAddr, timeout: Option<Duration>) -> InsightRequester {
    let mut settings = LlmSettings::for_base_url(format!("http://{addr}"));
    settings.request_timeout = timeout;
    InsightRequester::new(Arc::new(ChatCompletionsDriver::new(settings)))
}

fn request() -> InsightRequest {
    InsightRequest {
        document_text: "The study concluded X.".to_string(),
        question: "What is the conclusion?".to_string(),
        model: ModelChoice::Gpt4,
        temperature: 0.3,
    }
}

#[tokio::test]
async fn test_success_sends_expected_body() {
    let (addr, seen) = spawn_server().await;

    let record = requester(addr, None)
        .request(Some("sk-good"), request())
        .await
        .unwrap();
    assert_eq!(record.insight, "The conclusion is X.");

    let body = seen.lock().unwrap()[0].clone();
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["max_tokens"], 1000);
    assert_eq!(body["temperature"], 0.3);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(
        body["messages"][0]["content"],
        "You are a helpful assistant that provides clear, detailed document analysis."
    );
    assert_eq!(body["messages"][1]["role"], "user");
    assert!(
        body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("The study concluded X.")
    );
}

#[tokio::test]
async fn test_status_codes_map_to_error_kinds() {
    let (addr, _) = spawn_server().await;
    let requester = requester(addr, None);

    let err = requester.request(Some("sk-bad"), request()).await.unwrap_err();
    assert_eq!(err, InsightError::Authentication);

    let err = requester.request(Some("sk-busy"), request()).await.unwrap_err();
    assert_eq!(err, InsightError::RateLimited);

    let err = requester
        .request(Some("sk-unknown-model"), request())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        InsightError::InvalidRequest("The model `gpt-4` does not exist".to_string())
    );

    let err = requester.request(Some("sk-broken"), request()).await.unwrap_err();
    assert_eq!(
        err,
        InsightError::Other("HTTP 500: upstream exploded".to_string())
    );

    let err = requester.request(Some("sk-empty"), request()).await.unwrap_err();
    assert!(matches!(err, InsightError::Other(_)));
}

#[tokio::test]
async fn test_timeout_is_other() {
    let (addr, _) = spawn_server().await;

    let err = requester(addr, Some(Duration::from_millis(200)))
        .request(Some("sk-slow"), request())
        .await
        .unwrap_err();
    assert!(matches!(err, InsightError::Other(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_other() {
    // Bind and drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = requester(addr, Some(Duration::from_secs(5)))
        .request(Some("sk-good"), request())
        .await
        .unwrap_err();
    assert!(matches!(err, InsightError::Other(_)));
    assert!(err.to_string().starts_with("Error generating insights: "));
}

mod common;

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use axum_test::multipart::{MultipartForm, Part};
use doc_insights::AppState;
use doc_insights::config::AppConfig;
use doc_insights::llm::CompletionError;
use doc_insights::server::router;
use serde_json::{Value, json};

use common::{StubService, docx_with_paragraphs, pdf_with_pages, test_config};

fn setup(api_key: Option<&str>) -> (TestServer, Arc<StubService>) {
    setup_with(test_config(api_key))
}

fn setup_with(config: AppConfig) -> (TestServer, Arc<StubService>) {
    let stub = StubService::answering("The conclusion is X.");
    let state = AppState::new(Arc::new(config), stub.clone());
    let server = TestServer::new(router(state)).unwrap();
    (server, stub)
}

fn assert_json_error(response: &TestResponse, status: StatusCode, code: &str) {
    response.assert_status(status);
    let content_type = response.header("content-type");
    assert!(content_type.to_str().unwrap().starts_with("application/json"));
    assert_eq!(response.json::<Value>()["code"], code);
}

async fn new_session(server: &TestServer) -> String {
    let response = server.post("/api/sessions").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["id"].as_str().unwrap().to_string()
}

fn file_form(name: &str, mime: &str, bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(bytes).file_name(name).mime_type(mime))
}

async fn upload_text(server: &TestServer, id: &str, name: &str, text: &str) -> Value {
    let response = server
        .post(&format!("/api/sessions/{id}/document"))
        .multipart(file_form(name, "text/plain", text.as_bytes().to_vec()))
        .await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_options_lists_models_and_formats() {
    let (server, _) = setup(None);

    let response = server.get("/api/options").await;
    response.assert_status_ok();
    let body: Value = response.json();

    let models: Vec<&str> = body["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(models, ["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo"]);
    assert_eq!(body["default_model"], "gpt-3.5-turbo");
    assert_eq!(body["default_temperature"], 0.3);
    assert_eq!(body["server_credential"], false);
    assert_eq!(body["max_document_chars"], 12_000);
    assert_eq!(body["formats"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_index_page_is_served() {
    let (server, _) = setup(None);
    let response = server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains("Document Insights Generator"));
}

#[tokio::test]
async fn test_text_upload_generate_export_reset() {
    let (server, stub) = setup(None);
    let id = new_session(&server).await;

    let doc = upload_text(&server, &id, "notes.txt", "  Revenue grew 12%.\n").await;
    assert_eq!(doc["filename"], "notes.txt");
    assert_eq!(doc["kind"], "txt");
    assert_eq!(doc["char_count"], 17);
    assert_eq!(doc["preview"], "Revenue grew 12%.");

    let response = server
        .post(&format!("/api/sessions/{id}/insights"))
        .json(&json!({
            "question": "How much did revenue grow?",
            "api_key": "sk-user",
            "model": "gpt-4",
            "temperature": 0.5,
        }))
        .await;
    response.assert_status_ok();
    let record: Value = response.json();
    assert_eq!(record["insight"], "The conclusion is X.");
    assert_eq!(record["model"], "gpt-4");

    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "sk-user");
    assert_eq!(calls[0].1.model, "gpt-4");
    assert_eq!(calls[0].1.max_tokens, 1000);
    assert!(calls[0].1.messages[1].content.contains("Revenue grew 12%."));

    let snapshot: Value = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(snapshot["last_insight"]["insight"], "The conclusion is X.");

    let response = server
        .get(&format!("/api/sessions/{id}/export"))
        .add_query_param("format", "txt")
        .await;
    response.assert_status_ok();
    let disposition = response.header("content-disposition");
    assert!(
        disposition
            .to_str()
            .unwrap()
            .contains("filename=\"notes.txt_insights.txt\"")
    );
    let body = response.text();
    assert!(body.starts_with("Document: notes.txt\nQuestion: How much did revenue grow?\nGenerated: "));
    assert!(body.contains("INSIGHTS:\n\nThe conclusion is X.\n"));
    assert!(body.ends_with("Document Text (excerpt):\nRevenue grew 12%....\n"));

    let response = server
        .get(&format!("/api/sessions/{id}/export"))
        .add_query_param("format", "md")
        .await;
    response.assert_status_ok();
    assert!(response.text().starts_with("# Document Insights\n"));

    let response = server.post(&format!("/api/sessions/{id}/reset")).await;
    response.assert_status_ok();
    let snapshot: Value = response.json();
    assert!(snapshot["document"].is_null());
    assert!(snapshot["last_insight"].is_null());

    let response = server.get(&format!("/api/sessions/{id}/export")).await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "nothing_to_export");
}

#[cfg(all(feature = "pdf", feature = "docx"))]
#[tokio::test]
async fn test_pdf_and_docx_uploads() {
    let (server, _) = setup(None);
    let id = new_session(&server).await;

    let response = server
        .post(&format!("/api/sessions/{id}/document"))
        .multipart(file_form(
            "report.pdf",
            "application/pdf",
            pdf_with_pages(&["Alpha", "Beta"]),
        ))
        .await;
    response.assert_status_ok();
    let doc: Value = response.json();
    assert_eq!(doc["kind"], "pdf");
    assert_eq!(doc["preview"], "Alpha\nBeta");

    // Declared type is generic; the extension decides.
    let response = server
        .post(&format!("/api/sessions/{id}/document"))
        .multipart(file_form(
            "memo.docx",
            "application/octet-stream",
            docx_with_paragraphs(&["Dear team,", "We shipped."]),
        ))
        .await;
    response.assert_status_ok();
    let doc: Value = response.json();
    assert_eq!(doc["kind"], "docx");
    assert_eq!(doc["preview"], "Dear team,\nWe shipped.");
}

#[tokio::test]
async fn test_long_preview_is_cut() {
    let (server, _) = setup(None);
    let id = new_session(&server).await;

    let text = "a".repeat(1500);
    let doc = upload_text(&server, &id, "long.txt", &text).await;
    assert_eq!(doc["char_count"], 1500);
    assert_eq!(doc["preview"], format!("{}...", "a".repeat(1000)));
}

#[tokio::test]
async fn test_unsupported_format_is_rejected() {
    let (server, _) = setup(None);
    let id = new_session(&server).await;
    upload_text(&server, &id, "notes.txt", "keep me?").await;

    let response = server
        .post(&format!("/api/sessions/{id}/document"))
        .multipart(file_form("photo.png", "image/png", vec![0x89, b'P', b'N', b'G']))
        .await;
    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = response.json();
    assert_eq!(body["code"], "unsupported_format");
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Please upload PDF, DOCX, or TXT files.")
    );

    let snapshot: Value = server.get(&format!("/api/sessions/{id}")).await.json();
    assert!(snapshot["document"].is_null());
}

#[cfg(feature = "pdf")]
#[tokio::test]
async fn test_corrupt_pdf_reports_extraction_failure() {
    let (server, _) = setup(None);
    let id = new_session(&server).await;

    let response = server
        .post(&format!("/api/sessions/{id}/document"))
        .multipart(file_form("broken.pdf", "application/pdf", b"not a pdf".to_vec()))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["code"], "extraction_failed");
    assert!(body["error"].as_str().unwrap().starts_with("Error extracting PDF: "));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let (server, _) = setup(None);
    let id = new_session(&server).await;

    let response = server
        .post(&format!("/api/sessions/{id}/document"))
        .multipart(MultipartForm::new().add_text("purpose", "analysis"))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "missing_file");
}

#[tokio::test]
async fn test_generate_validation_makes_no_call() {
    let (server, stub) = setup(None);
    let id = new_session(&server).await;
    let url = format!("/api/sessions/{id}/insights");

    let response = server.post(&url).json(&json!({"question": "Anything?", "api_key": "sk"})).await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["code"], "missing_document");

    upload_text(&server, &id, "notes.txt", "Some text.").await;

    let response = server.post(&url).json(&json!({"question": "Anything?"})).await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "missing_credential");
    assert_eq!(body["error"], "Please enter your OpenAI API key.");

    let response = server.post(&url).json(&json!({"question": "  ", "api_key": "sk"})).await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "Please enter a question.");

    let response = server
        .post(&url)
        .json(&json!({"question": "q", "api_key": "sk", "temperature": 1.2}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "invalid_temperature");

    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn test_server_credential_is_fallback() {
    let (server, stub) = setup(Some("sk-server"));
    let id = new_session(&server).await;
    upload_text(&server, &id, "notes.txt", "Some text.").await;

    let options: Value = server.get("/api/options").await.json();
    assert_eq!(options["server_credential"], true);

    server
        .post(&format!("/api/sessions/{id}/insights"))
        .json(&json!({"question": "Summarize", "api_key": ""}))
        .await
        .assert_status_ok();

    let calls = stub.calls();
    assert_eq!(calls[0].0, "sk-server");
    assert_eq!(calls[0].1.model, "gpt-3.5-turbo");
    assert!((calls[0].1.temperature - 0.3).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_remote_failures_map_to_statuses() {
    let (server, stub) = setup(None);
    let id = new_session(&server).await;
    upload_text(&server, &id, "notes.txt", "Some text.").await;
    let url = format!("/api/sessions/{id}/insights");
    let ask = json!({"question": "Summarize", "api_key": "sk"});

    server.post(&url).json(&ask).await.assert_status_ok();

    stub.set_reply(Err(CompletionError::Status {
        status: 401,
        message: "Incorrect API key provided".to_string(),
    }));
    let response = server.post(&url).json(&ask).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "authentication_failed");
    assert_eq!(
        body["error"],
        "Invalid API key. Please check your OpenAI API key and try again."
    );

    stub.set_reply(Err(CompletionError::Status {
        status: 429,
        message: "quota".to_string(),
    }));
    server
        .post(&url)
        .json(&ask)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    stub.set_reply(Err(CompletionError::Status {
        status: 400,
        message: "maximum context length exceeded".to_string(),
    }));
    let response = server.post(&url).json(&ask).await;
    response.assert_status_bad_request();
    assert_eq!(
        response.json::<Value>()["error"],
        "Invalid request: maximum context length exceeded"
    );

    stub.set_reply(Err(CompletionError::Transport("connection reset".to_string())));
    let response = server.post(&url).json(&ask).await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.json::<Value>()["error"],
        "Error generating insights: connection reset"
    );

    // Failures leave the earlier answer in place.
    let snapshot: Value = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(snapshot["last_insight"]["insight"], "The conclusion is X.");
}

#[tokio::test]
async fn test_new_upload_clears_previous_insight() {
    let (server, _) = setup(None);
    let id = new_session(&server).await;
    upload_text(&server, &id, "a.txt", "First document.").await;
    server
        .post(&format!("/api/sessions/{id}/insights"))
        .json(&json!({"question": "Summarize", "api_key": "sk"}))
        .await
        .assert_status_ok();

    upload_text(&server, &id, "b.txt", "Second document.").await;

    let snapshot: Value = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(snapshot["document"]["filename"], "b.txt");
    assert!(snapshot["last_insight"].is_null());
}

#[tokio::test]
async fn test_unknown_and_deleted_sessions() {
    let (server, _) = setup(None);

    let response = server.get("/api/sessions/does-not-exist").await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["code"], "session_not_found");

    let id = new_session(&server).await;
    server
        .delete(&format!("/api/sessions/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/sessions/{id}"))
        .await
        .assert_status_not_found();
    server
        .post(&format!("/api/sessions/{id}/reset"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_text_like_extensions_are_unsupported() {
    let (server, _) = setup(None);
    let id = new_session(&server).await;

    for name in ["server.log", "app.conf"] {
        let response = server
            .post(&format!("/api/sessions/{id}/document"))
            .multipart(file_form(name, "application/octet-stream", b"plain words".to_vec()))
            .await;
        assert_json_error(&response, StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_format");
    }
}

#[tokio::test]
async fn test_oversized_upload_is_payload_too_large() {
    let mut config = test_config(None);
    config.server.max_upload_bytes = 1024;
    let (server, _) = setup_with(config);
    let id = new_session(&server).await;

    let response = server
        .post(&format!("/api/sessions/{id}/document"))
        .multipart(file_form("big.txt", "text/plain", vec![b'a'; 8 * 1024]))
        .await;
    assert_json_error(&response, StatusCode::PAYLOAD_TOO_LARGE, "upload_too_large");

    let snapshot: Value = server.get(&format!("/api/sessions/{id}")).await.json();
    assert!(snapshot["document"].is_null());
}

#[cfg(feature = "pdf")]
#[tokio::test]
async fn test_failed_extraction_clears_loaded_document() {
    let (server, _) = setup(None);
    let id = new_session(&server).await;
    upload_text(&server, &id, "notes.txt", "Earlier document.").await;
    server
        .post(&format!("/api/sessions/{id}/insights"))
        .json(&json!({"question": "Summarize", "api_key": "sk"}))
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/api/sessions/{id}/document"))
        .multipart(file_form("broken.pdf", "application/pdf", b"not a pdf".to_vec()))
        .await;
    assert_json_error(&response, StatusCode::UNPROCESSABLE_ENTITY, "extraction_failed");

    let snapshot: Value = server.get(&format!("/api/sessions/{id}")).await.json();
    assert!(snapshot["document"].is_null());
    assert!(snapshot["last_insight"].is_null());

    let response = server
        .post(&format!("/api/sessions/{id}/insights"))
        .json(&json!({"question": "Summarize", "api_key": "sk"}))
        .await;
    assert_json_error(&response, StatusCode::BAD_REQUEST, "missing_document");
}

#[tokio::test]
async fn test_empty_document_cannot_be_queried() {
    let (server, stub) = setup(None);
    let id = new_session(&server).await;

    let doc = upload_text(&server, &id, "blank.txt", "  \n\t\n").await;
    assert_eq!(doc["char_count"], 0);

    let response = server
        .post(&format!("/api/sessions/{id}/insights"))
        .json(&json!({"question": "Anything?", "api_key": "sk"}))
        .await;
    assert_json_error(&response, StatusCode::BAD_REQUEST, "missing_document");
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn test_unsupported_model_is_invalid_request() {
    let (server, stub) = setup(None);
    let id = new_session(&server).await;
    upload_text(&server, &id, "notes.txt", "Some text.").await;

    let response = server
        .post(&format!("/api/sessions/{id}/insights"))
        .json(&json!({"question": "q", "api_key": "sk", "model": "gpt-9"}))
        .await;
    assert_json_error(&response, StatusCode::BAD_REQUEST, "invalid_request");
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request: unknown model 'gpt-9'"));
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_body_and_query_return_json_errors() {
    let (server, _) = setup(None);
    let id = new_session(&server).await;

    let response = server
        .post(&format!("/api/sessions/{id}/insights"))
        .bytes(Bytes::from_static(b"{not json"))
        .content_type("application/json")
        .await;
    assert_json_error(&response, StatusCode::BAD_REQUEST, "invalid_body");

    let response = server
        .post(&format!("/api/sessions/{id}/insights"))
        .json(&json!({"question": "q", "temperature": "warm"}))
        .await;
    assert_json_error(&response, StatusCode::UNPROCESSABLE_ENTITY, "invalid_body");

    let response = server
        .get(&format!("/api/sessions/{id}/export"))
        .add_query_param("format", "pdf")
        .await;
    assert_json_error(&response, StatusCode::BAD_REQUEST, "invalid_query");
}

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use doc_insights::config::{AppConfig, LlmConfig, ServerConfig, SessionConfig};
use doc_insights::llm::{CompletionError, CompletionRequest, CompletionService, ModelChoice};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Completion service that replays a configurable reply and records calls.
pub struct StubService {
    reply: Mutex<Result<String, CompletionError>>,
    calls: Mutex<Vec<(String, CompletionRequest)>>,
}

impl StubService {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Ok(text.to_string())),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_reply(&self, reply: Result<String, CompletionError>) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<(String, CompletionRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for StubService {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((api_key.to_string(), request.clone()));
        self.reply.lock().unwrap().clone()
    }
}

/// Configuration with defaults and an optional server credential.
pub fn test_config(api_key: Option<&str>) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_upload_bytes: 10 * 1024 * 1024,
        },
        llm: LlmConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: api_key.map(ToString::to_string),
            default_model: ModelChoice::Gpt35Turbo,
            default_temperature: 0.3,
            request_timeout_secs: None,
            azure_deployment: None,
            azure_api_version: None,
        },
        session: SessionConfig {
            idle_timeout_secs: 1800,
        },
    }
}

/// A PDF with one line of text per page.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// A DOCX with one paragraph per entry.
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let mut docx = docx_rs::Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(
            docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(*text)),
        );
    }
    let mut cursor = Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();
    cursor.into_inner()
}

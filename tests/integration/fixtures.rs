//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - A scripted assistant that records prompts
//! - Pages built from the builtin catalog
//! - A proxy server bound to an ephemeral port in front of a mock upstream

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use govdesk::assistant::{Assistant, AssistantError};
use govdesk::config::ServerConfig;
use govdesk::content::ServiceCatalog;
use govdesk::page::{Document, Page};
use govdesk::proxy::{router, Gemini, ProxyState};

/// Assistant that answers from a queue, optionally after a delay.
pub struct ScriptedAssistant {
    replies: Mutex<VecDeque<Result<String, AssistantError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Duration,
}

impl ScriptedAssistant {
    pub fn new(replies: Vec<Result<String, AssistantError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn ask(&self, prompt: &str) -> Result<String, AssistantError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::NoText { error: None }))
    }
}

pub fn catalog() -> Arc<ServiceCatalog> {
    Arc::new(ServiceCatalog::builtin())
}

pub fn page(catalog: &ServiceCatalog) -> Page {
    Page::new(Document::new(catalog))
}

/// Mock upstream that lists one model and answers `generateContent` with `text`.
pub async fn upstream_replying(text: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "models/gemini-2.0-flash", "supportedGenerationMethods": ["generateContent"] }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [ { "content": { "parts": [ { "text": text } ] } } ]
        })))
        .mount(&server)
        .await;
    server
}

/// Serve the proxy on an ephemeral port. Returns the `/api/gemini` URL.
pub async fn spawn_proxy(upstream: &str, key: Option<&str>) -> String {
    let gemini = Gemini::new(
        upstream,
        key.map(str::to_string),
        ServerConfig::default().effective_models(),
    )
    .unwrap();
    let app = router(Arc::new(ProxyState { gemini }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}/api/gemini", addr)
}

//! The HTTP client against the proxy server against a mocked upstream.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use govdesk::assistant::{Assistant, AssistantError, ProxyClient};
use govdesk::chat::{ChatController, SubmitOutcome};
use govdesk::markup::CmarkRenderer;

use crate::fixtures::{catalog, page, spawn_proxy, upstream_replying};

#[tokio::test]
async fn test_client_gets_upstream_text() {
    let upstream = upstream_replying("Open **mParivahan** and choose DL services.").await;
    let endpoint = spawn_proxy(&upstream.uri(), Some("test-key")).await;

    let client = ProxyClient::new(endpoint).unwrap();
    let text = client.ask("renew my licence").await.unwrap();
    assert_eq!(text, "Open **mParivahan** and choose DL services.");
}

#[tokio::test]
async fn test_missing_key_surfaces_server_error() {
    let upstream = MockServer::start().await;
    let endpoint = spawn_proxy(&upstream.uri(), None).await;

    let client = ProxyClient::new(endpoint).unwrap();
    let err = client.ask("hi").await.unwrap_err();
    assert_eq!(
        err,
        AssistantError::NoText {
            error: Some("GEMINI_API_KEY missing or invalid on server".to_string())
        }
    );
    assert_eq!(err.to_string(), "GEMINI_API_KEY missing or invalid on server");
}

#[tokio::test]
async fn test_upstream_failure_reaches_transcript() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [ { "name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["generateContent"] } ]
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": "overloaded" })))
        .mount(&upstream)
        .await;
    let endpoint = spawn_proxy(&upstream.uri(), Some("test-key")).await;

    let catalog = catalog();
    let page = page(&catalog);
    let chat = ChatController::new(page.clone(), Arc::new(ProxyClient::new(endpoint).unwrap()));

    let outcome = chat.submit("status of my voter id").await;
    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    page.read(|doc| {
        let last = doc.chat.as_ref().unwrap().transcript.last().unwrap();
        assert_eq!(last.html, "⚠ Model endpoint returned non-200");
    });
}

#[tokio::test]
async fn test_end_to_end_markdown_reply() {
    let upstream = upstream_replying("Use **Bhim UPI** to pay.").await;
    let endpoint = spawn_proxy(&upstream.uri(), Some("test-key")).await;

    let catalog = catalog();
    let page = page(&catalog);
    let chat = ChatController::new(page.clone(), Arc::new(ProxyClient::new(endpoint).unwrap()))
        .with_renderer(Arc::new(CmarkRenderer));

    assert_eq!(chat.submit("how to pay electricity bill").await, SubmitOutcome::Replied);
    page.read(|doc| {
        let last = doc.chat.as_ref().unwrap().transcript.last().unwrap();
        assert!(last.html.contains("<strong>Bhim UPI</strong>"));
    });
}

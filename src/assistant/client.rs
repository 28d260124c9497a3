//! HTTP client for the assistant proxy (`POST {"prompt": ...}`).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::{glog_debug, glog_trace, glog_warn, Result};

use super::{Assistant, AssistantError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    prompt: &'a str,
}

pub struct ProxyClient {
    endpoint: String,
    http: reqwest::Client,
}

impl ProxyClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Assistant for ProxyClient {
    async fn ask(&self, prompt: &str) -> std::result::Result<String, AssistantError> {
        glog_debug!(
            "ProxyClient::ask endpoint={} prompt_len={}",
            self.endpoint,
            prompt.len()
        );
        let response = self
            .http
            .post(&self.endpoint)
            .json(&AskRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                glog_warn!("ProxyClient request failed: {}", e);
                AssistantError::Network(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AssistantError::Network(e.to_string()))?;
        glog_trace!("ProxyClient status={} body={}", status, truncate(&body, 500));

        let result = parse_reply(status, &body);
        if let Err(e) = &result {
            glog_warn!("Assistant reply unusable: status={} error={:?}", status, e);
        }
        result
    }
}

/// Interpret a proxy response.
///
/// Non-2xx: the body's `error` field if it parses, else the bare status.
/// 2xx: `text` when `success` is true, or any non-empty `text`; otherwise
/// the body's `error` (or nothing) as [`AssistantError::NoText`].
pub fn parse_reply(status: u16, body: &str) -> std::result::Result<String, AssistantError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| error_field(&v));
        return Err(AssistantError::NonOk { status, message });
    }

    let value: Value = serde_json::from_str(body).map_err(|_| AssistantError::InvalidJson)?;
    let text = value
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty());

    if let Some(text) = text {
        return Ok(text.to_string());
    }

    Err(AssistantError::NoText {
        error: error_field(&value),
    })
}

fn error_field(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_success_shapes() {
        assert_eq!(
            parse_reply(200, r#"{"success": true, "text": "Visit the portal."}"#).unwrap(),
            "Visit the portal."
        );
        // No success flag, but usable text.
        assert_eq!(parse_reply(200, r#"{"text": "ok"}"#).unwrap(), "ok");
    }

    #[test]
    fn test_parse_failure_precedence() {
        assert_eq!(
            parse_reply(500, r#"{"error": "upstream exploded"}"#).unwrap_err(),
            AssistantError::NonOk {
                status: 500,
                message: Some("upstream exploded".to_string())
            }
        );
        assert_eq!(
            parse_reply(503, "<html>busy</html>").unwrap_err().to_string(),
            "Server returned 503"
        );
        assert_eq!(
            parse_reply(200, "not json").unwrap_err(),
            AssistantError::InvalidJson
        );
        assert_eq!(
            parse_reply(200, r#"{"success": false, "error": "model selection failed"}"#)
                .unwrap_err()
                .to_string(),
            "model selection failed"
        );
        assert_eq!(
            parse_reply(200, r#"{"success": false}"#).unwrap_err(),
            AssistantError::NoText { error: None }
        );
        assert_eq!(
            parse_reply(200, r#"{"text": ""}"#).unwrap_err().to_string(),
            "No text returned"
        );
    }

    #[test]
    fn test_blank_success_is_no_text() {
        assert_eq!(
            parse_reply(200, r#"{"success": true, "text": ""}"#).unwrap_err(),
            AssistantError::NoText { error: None }
        );
        assert_eq!(
            parse_reply(200, r#"{"success": true, "text": " \n "}"#).unwrap_err(),
            AssistantError::NoText { error: None }
        );
    }

    #[test]
    fn test_error_object_message() {
        assert_eq!(
            parse_reply(400, r#"{"error": {"message": "bad prompt"}}"#)
                .unwrap_err()
                .to_string(),
            "bad prompt"
        );
    }

    #[tokio::test]
    async fn test_ask_posts_prompt_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/gemini"))
            .and(body_json(serde_json::json!({ "prompt": "hello" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "success": true, "text": "hi there" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ProxyClient::new(format!("{}/api/gemini", server.uri())).unwrap();
        let reply = assert_ok!(client.ask("hello").await);
        assert_eq!(reply, "hi there");
    }

    #[tokio::test]
    async fn test_ask_surfaces_non_ok_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({ "error": "quota exceeded" })),
            )
            .mount(&server)
            .await;

        let client = ProxyClient::new(format!("{}/api/gemini", server.uri())).unwrap();
        let err = assert_err!(client.ask("x").await);
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[tokio::test]
    async fn test_ask_network_failure() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ProxyClient::new(format!("http://127.0.0.1:{}/api/gemini", port)).unwrap();
        let err = assert_err!(client.ask("x").await);
        assert!(matches!(err, AssistantError::Network(_)));
        assert_eq!(err.to_string(), "Network or proxy error");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("₹₹₹", 2), "₹₹");
        assert_eq!(truncate("ab", 5), "ab");
    }
}

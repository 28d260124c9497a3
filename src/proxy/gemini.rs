//! Upstream Generative Language API: model discovery, generation and reply
//! text extraction.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::ServerConfig;
use crate::{glog_debug, glog_trace, glog_warn};

const LIST_TIMEOUT: Duration = Duration::from_secs(15);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(25);
const BODY_EXCERPT: usize = 2000;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY missing or invalid on server")]
    MissingKey,

    #[error("model selection failed")]
    ModelSelection(String),

    #[error("HTTP error contacting Gemini")]
    Transport(String),

    #[error("Model endpoint returned non-200")]
    NonOk { status: u16, body: Value },

    #[error("Model returned non-JSON")]
    NonJson { body: String },

    #[error("Could not extract text from model response")]
    NoText { raw: Value },
}

impl GeminiError {
    /// Failure body returned to proxy clients.
    pub fn to_body(&self) -> Value {
        let mut body = json!({ "success": false, "error": self.to_string() });
        match self {
            GeminiError::MissingKey => {}
            GeminiError::ModelSelection(details) | GeminiError::Transport(details) => {
                body["details"] = json!(details);
            }
            GeminiError::NonOk { status, body: upstream } => {
                body["status"] = json!(status);
                body["body"] = upstream.clone();
            }
            GeminiError::NonJson { body: upstream } => {
                body["body"] = json!(upstream);
            }
            GeminiError::NoText { raw } => {
                body["raw"] = raw.clone();
            }
        }
        body
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub text: String,
    pub raw: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelInfo {
    name: Option<String>,
    #[serde(default, rename = "supportedGenerationMethods")]
    methods: Vec<String>,
}

impl ModelInfo {
    fn generates_content(&self) -> bool {
        self.methods.iter().any(|m| m == "generateContent")
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

pub struct Gemini {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    preferred: Vec<String>,
    /// Successful model listing, kept for the process lifetime.
    models: OnceCell<Vec<ModelInfo>>,
}

impl Gemini {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        preferred: Vec<String>,
    ) -> crate::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            preferred,
            models: OnceCell::new(),
        })
    }

    /// Configure from `[server]` settings and the `GEMINI_API_KEY` variable.
    pub fn from_config(config: &ServerConfig) -> crate::Result<Self> {
        let api_key = std::env::var(API_KEY_VAR).ok();
        if api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            glog_warn!("{} not set; requests will fail until it is", API_KEY_VAR);
        }
        Self::new(
            config.effective_upstream(),
            api_key,
            config.effective_models(),
        )
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn list_models(&self, key: &str) -> Result<&[ModelInfo], String> {
        let models = self
            .models
            .get_or_try_init(|| async {
                let url = format!("{}/v1/models", self.base_url);
                let response = self
                    .http
                    .get(&url)
                    .query(&[("key", key)])
                    .timeout(LIST_TIMEOUT)
                    .send()
                    .await
                    .map_err(|e| format!("ListModels request failed: {}", e))?;
                let status = response.status().as_u16();
                let body = response.text().await.map_err(|e| e.to_string())?;

                let data: Value = serde_json::from_str(&body).map_err(|_| {
                    format!(
                        "ListModels failed: status={} body={}",
                        status,
                        excerpt(&body)
                    )
                })?;
                if let Some(err) = data.get("error") {
                    let message = err
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown API error");
                    return Err(format!("Gemini API Error: {}", message));
                }
                let list: ModelList = serde_json::from_value(data).map_err(|e| e.to_string())?;
                glog_debug!("Gemini: {} models listed", list.models.len());
                Ok(list.models)
            })
            .await?;
        Ok(models.as_slice())
    }

    /// Preferred model first, then any model that can generate content.
    async fn pick_model(&self, key: &str) -> Result<String, String> {
        let models = self.list_models(key).await?;
        if models.is_empty() {
            return Err("No models returned by ListModels".to_string());
        }

        for preferred in &self.preferred {
            let usable = models
                .iter()
                .any(|m| m.name.as_deref() == Some(preferred.as_str()) && m.generates_content());
            if usable {
                return Ok(preferred.clone());
            }
        }

        models
            .iter()
            .filter(|m| m.generates_content())
            .find_map(|m| m.name.clone())
            .ok_or_else(|| "No model supporting generateContent found for this API key".to_string())
    }

    pub async fn generate(&self, prompt: &str) -> Result<Generated, GeminiError> {
        let key = self.api_key.as_deref().ok_or(GeminiError::MissingKey)?;
        let model = self
            .pick_model(key)
            .await
            .map_err(GeminiError::ModelSelection)?;
        let short = model.rsplit('/').next().unwrap_or(model.as_str());
        glog_debug!("Gemini: generating with {}", short);

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, short);
        let payload = json!({ "contents": [ { "parts": [ { "text": prompt } ] } ] });
        let response = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .json(&payload)
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                glog_warn!("Gemini request failed: {}", e);
                GeminiError::Transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GeminiError::Transport(e.to_string()))?;

        if status != 200 {
            let body = serde_json::from_str(&body).unwrap_or_else(|_| json!(excerpt(&body)));
            return Err(GeminiError::NonOk { status, body });
        }

        let raw: Value = serde_json::from_str(&body).map_err(|_| GeminiError::NonJson {
            body: excerpt(&body).to_string(),
        })?;
        glog_trace!("Gemini raw response: {}", excerpt(&raw.to_string()));

        match extract_text(&raw) {
            Some(text) => Ok(Generated { text, raw }),
            None => Err(GeminiError::NoText { raw }),
        }
    }
}

fn excerpt(s: &str) -> &str {
    match s.char_indices().nth(BODY_EXCERPT) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Pull the reply text out of a generateContent response, whatever its shape.
/// Blank text counts as no text.
pub fn extract_text(data: &Value) -> Option<String> {
    first_text(data).filter(|text| !text.trim().is_empty())
}

fn first_text(data: &Value) -> Option<String> {
    if let Some(content) = data.pointer("/candidates/0/content") {
        match content {
            Value::Array(blocks) => {
                for block in blocks {
                    if let Some(text) = block.get("text").and_then(Value::as_str) {
                        return Some(text.to_string());
                    }
                    if let Some(text) = block.pointer("/parts/0").and_then(part_text) {
                        return Some(text);
                    }
                }
            }
            Value::Object(_) => {
                if let Some(text) = content.pointer("/parts/0").and_then(part_text) {
                    return Some(text);
                }
            }
            _ => {}
        }
    }

    if let Some(items) = data.get("output").and_then(Value::as_array) {
        let found = items
            .iter()
            .filter_map(|item| item.get("content").and_then(Value::as_array))
            .flatten()
            .find_map(|c| c.get("text").and_then(Value::as_str));
        if let Some(text) = found {
            return Some(text.to_string());
        }
    }

    find_text(data).map(str::to_string)
}

fn part_text(part: &Value) -> Option<String> {
    match part {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => part.get("text").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Depth-first: the first non-empty string stored under a `text` key.
fn find_text(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                if !text.is_empty() {
                    return Some(text);
                }
            }
            map.values().find_map(find_text)
        }
        Value::Array(items) => items.iter().find_map(find_text),
        _ => None,
    }
}

//! `govdesk serve`: a small HTTP proxy in front of the Generative Language
//! API so the API key never leaves the server.
//!
//! Every `/api/gemini` answer is HTTP 200 with a `success` flag; failures
//! carry an `error` string plus whatever upstream detail was available.

pub mod gemini;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ServerConfig;
use crate::{glog, glog_warn, Result};

pub use gemini::{extract_text, Gemini, GeminiError, Generated, API_KEY_VAR};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub prompt: String,
}

pub struct ProxyState {
    pub gemini: Gemini,
}

pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/gemini", post(ask))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ask(State(state): State<Arc<ProxyState>>, Json(req): Json<AskRequest>) -> Json<Value> {
    glog!("POST /api/gemini prompt_len={}", req.prompt.len());
    match state.gemini.generate(&req.prompt).await {
        Ok(generated) => Json(json!({
            "success": true,
            "text": generated.text,
            "raw": generated.raw,
        })),
        Err(e) => {
            glog_warn!("Proxy: {:?}", e);
            Json(e.to_body())
        }
    }
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let gemini = Gemini::from_config(config)?;
    let app = router(Arc::new(ProxyState { gemini }));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    glog!("Proxy listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

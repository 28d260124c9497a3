//! The remote assistant: one prompt in, one reply text out.

pub mod client;

use async_trait::async_trait;
use thiserror::Error;

pub use client::ProxyClient;

/// Why an assistant call produced no reply. `Display` is the single line
/// shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// Connection refused, DNS failure, timeout.
    #[error("Network or proxy error")]
    Network(String),

    #[error("{}", status_message(.status, .message))]
    NonOk { status: u16, message: Option<String> },

    #[error("Invalid JSON from server")]
    InvalidJson,

    #[error("{}", .error.as_deref().unwrap_or("No text returned"))]
    NoText { error: Option<String> },
}

fn status_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(m) => m.clone(),
        None => format!("Server returned {}", status),
    }
}

#[async_trait]
pub trait Assistant: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String, AssistantError>;
}

//! Info lookup panel: ask about an app, optionally with a problem, in a
//! chosen language.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::assistant::{Assistant, AssistantError};
use crate::markup::{escape_html, render_or_escape, MarkdownRenderer};
use crate::page::{LookupOutput, LookupPanel, Page};
use crate::{glog_debug, glog_warn};

pub const DEFAULT_LANGUAGE: &str = "english";
pub const DEFAULT_APP: &str = "umang";

pub const LANGUAGES: [&str; 6] = ["english", "hindi", "bengali", "tamil", "telugu", "marathi"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub language: String,
    pub app: String,
    pub problem: Option<String>,
}

impl LookupRequest {
    pub fn new(language: &str, app: &str, problem: Option<&str>) -> Self {
        let or_default = |value: &str, default: &str| {
            let value = value.trim();
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };
        Self {
            language: or_default(language, DEFAULT_LANGUAGE),
            app: or_default(app, DEFAULT_APP),
            problem: problem
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        }
    }

    pub fn from_panel(panel: &LookupPanel) -> Self {
        Self::new(&panel.language, &panel.app, Some(&panel.problem))
    }

    pub fn prompt(&self) -> String {
        match &self.problem {
            Some(problem) => format!(
                "I am facing a problem with the {} app. The problem is: {}. Please explain how to fix this in {}.",
                self.app, problem, self.language
            ),
            None => format!(
                "Tell me about the {} app and its key features in {}.",
                self.app, self.language
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Ignored,
    Shown,
    Failed(AssistantError),
    /// Superseded by a newer lookup or a clear.
    Discarded,
}

pub struct LookupController {
    page: Page,
    assistant: Arc<dyn Assistant>,
    renderer: Option<Arc<dyn MarkdownRenderer>>,
    current: Mutex<Option<CancellationToken>>,
}

impl LookupController {
    pub fn new(page: Page, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            page,
            assistant,
            renderer: None,
            current: Mutex::new(None),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Cancel whatever is in flight and hand out a token for the next request.
    fn replace_token(&self, next: Option<CancellationToken>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            previous.cancel();
        }
        *current = next;
    }

    /// Look up using the panel's current field values.
    pub async fn show_from_panel(&self) -> LookupOutcome {
        let Some(request) = self
            .page
            .read(|doc| doc.lookup.as_ref().map(LookupRequest::from_panel))
        else {
            return LookupOutcome::Ignored;
        };
        self.show(request).await
    }

    pub async fn show(&self, request: LookupRequest) -> LookupOutcome {
        let token = CancellationToken::new();
        let started = self.page.with(|doc| {
            let Some(panel) = doc.lookup.as_mut() else {
                return false;
            };
            panel.output = LookupOutput::Loading;
            true
        });
        if !started {
            return LookupOutcome::Ignored;
        }
        self.replace_token(Some(token.clone()));

        glog_debug!(
            "Lookup: app={} language={} problem={:?}",
            request.app,
            request.language,
            request.problem
        );
        let prompt = request.prompt();
        let result = tokio::select! {
            _ = token.cancelled() => return LookupOutcome::Discarded,
            result = self.assistant.ask(&prompt) => result,
        };

        let renderer = self.renderer.as_deref();
        let (output, outcome) = match result {
            Ok(text) => (
                LookupOutput::Ready(render_or_escape(renderer, &text)),
                LookupOutcome::Shown,
            ),
            Err(e) => {
                glog_warn!("Lookup failed: {}", e);
                (
                    LookupOutput::Failed(format!("⚠ {}", escape_html(&e.to_string()))),
                    LookupOutcome::Failed(e),
                )
            }
        };

        self.page.with(|doc| {
            if token.is_cancelled() {
                return LookupOutcome::Discarded;
            }
            match doc.lookup.as_mut() {
                Some(panel) => {
                    panel.output = output;
                    outcome
                }
                None => LookupOutcome::Ignored,
            }
        })
    }

    /// Hide and empty the output, dropping any pending request.
    pub fn clear(&self) {
        self.replace_token(None);
        self.page.with(|doc| {
            if let Some(panel) = doc.lookup.as_mut() {
                panel.output = LookupOutput::Hidden;
            }
        });
    }
}

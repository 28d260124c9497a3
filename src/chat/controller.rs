use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::assistant::{Assistant, AssistantError};
use crate::config::DEFAULT_REPLY_DELAY_MS;
use crate::markup::MarkdownRenderer;
use crate::page::{Message, Notice, Page};
use crate::speech::{SpeechCapture, SpeechError};
use crate::{glog_debug, glog_warn};

use super::rules::canned_reply;

/// Prepended to every free-form question so replies stay short.
pub const SYSTEM_INSTRUCTION: &str = "Be concise. Reply in 1–2 short sentences, directly answering the user's question. Do not add long explanations. Use Markdown if needed.";

pub fn build_prompt(text: &str) -> String {
    format!("{}\n\nUser: {}", SYSTEM_INSTRUCTION, text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty input, or no chat pane.
    Ignored,
    Canned,
    Replied,
    Failed(AssistantError),
    /// The session was reset before the reply landed.
    Discarded,
}

/// Owns the transcript and input of the chat pane.
pub struct ChatController {
    page: Page,
    assistant: Arc<dyn Assistant>,
    renderer: Option<Arc<dyn MarkdownRenderer>>,
    speech: Option<Arc<dyn SpeechCapture>>,
    reply_delay: Duration,
    session: Mutex<CancellationToken>,
}

impl ChatController {
    pub fn new(page: Page, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            page,
            assistant,
            renderer: None,
            speech: None,
            reply_delay: Duration::from_millis(DEFAULT_REPLY_DELAY_MS),
            session: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_speech(mut self, speech: Option<Arc<dyn SpeechCapture>>) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    fn session_token(&self) -> CancellationToken {
        self.session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Submit whatever is in the input box.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self
            .page
            .read(|doc| doc.chat.as_ref().map(|c| c.input.clone()))
            .unwrap_or_default();
        self.submit(&text).await
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let token = self.session_token();
        let appended = self.page.with(|doc| {
            let Some(chat) = doc.chat.as_mut() else {
                return false;
            };
            chat.transcript.append(Message::user(text), None);
            chat.input.clear();
            chat.transcript.show_typing();
            true
        });
        if !appended {
            return SubmitOutcome::Ignored;
        }

        if let Some(reply) = canned_reply(text) {
            glog_debug!("Chat: canned reply for {:?}", text);
            tokio::select! {
                _ = token.cancelled() => return SubmitOutcome::Discarded,
                _ = tokio::time::sleep(self.reply_delay) => {}
            }
            return if self.settle(&token, Message::assistant_plain(reply)) {
                SubmitOutcome::Canned
            } else {
                SubmitOutcome::Discarded
            };
        }

        let prompt = build_prompt(text);
        let result = tokio::select! {
            _ = token.cancelled() => return SubmitOutcome::Discarded,
            result = self.assistant.ask(&prompt) => result,
        };

        match result {
            Ok(reply) => {
                if self.settle(&token, Message::assistant_markdown(reply)) {
                    SubmitOutcome::Replied
                } else {
                    SubmitOutcome::Discarded
                }
            }
            Err(e) => {
                glog_warn!("Chat: assistant failed: {}", e);
                if self.settle(&token, Message::error(e.to_string())) {
                    SubmitOutcome::Failed(e)
                } else {
                    SubmitOutcome::Discarded
                }
            }
        }
    }

    /// Remove the typing indicator, then append `message`, unless the
    /// session this reply belongs to has been reset.
    fn settle(&self, token: &CancellationToken, message: Message) -> bool {
        let renderer = self.renderer.as_deref();
        self.page.with(|doc| {
            if token.is_cancelled() {
                return false;
            }
            let Some(chat) = doc.chat.as_mut() else {
                return false;
            };
            chat.transcript.hide_typing();
            chat.transcript.append(message, renderer);
            true
        })
    }

    /// Capture one voice transcript into the input box.
    pub async fn dictate(&self) -> Result<(), SpeechError> {
        if self.page.read(|doc| doc.chat.is_none()) {
            return Ok(());
        }
        let Some(speech) = self.speech.clone() else {
            self.notify(SpeechError::Unavailable.to_string());
            return Err(SpeechError::Unavailable);
        };

        match speech.capture().await {
            Ok(transcript) => {
                self.page.with(|doc| {
                    if let Some(chat) = doc.chat.as_mut() {
                        chat.input = transcript;
                    }
                });
                Ok(())
            }
            Err(e) => {
                self.notify(e.to_string());
                Err(e)
            }
        }
    }

    fn notify(&self, message: String) {
        self.page.with(|doc| doc.notice = Some(Notice { message }));
    }

    /// Start over: pending replies are dropped and the transcript cleared.
    pub fn new_session(&self) {
        {
            let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
            session.cancel();
            *session = CancellationToken::new();
        }
        self.page.with(|doc| {
            if let Some(chat) = doc.chat.as_mut() {
                chat.transcript = Default::default();
            }
        });
        glog_debug!("Chat: new session");
    }
}

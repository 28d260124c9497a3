//! Voice dictation through an external capture program.
//!
//! The configured `speech_command` is run once per dictation; whatever it
//! prints on stdout (trimmed) is the transcript.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::{glog_debug, glog_warn};

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("Voice not supported")]
    Unavailable,

    #[error("Voice capture failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait SpeechCapture: Send + Sync {
    async fn capture(&self) -> Result<String, SpeechError>;
}

#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSpeech {
    /// Resolve a command line such as `"whisper-listen --lang en-IN"`.
    /// Returns `None` when the program cannot be found on PATH.
    pub fn resolve(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        let program = match which::which(program) {
            Ok(path) => path,
            Err(e) => {
                glog_warn!("Speech command '{}' not found: {}", program, e);
                return None;
            }
        };
        glog_debug!("Speech command resolved to {}", program.display());
        Some(Self {
            program,
            args: parts.map(str::to_string).collect(),
            timeout: CAPTURE_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SpeechCapture for CommandSpeech {
    async fn capture(&self) -> Result<String, SpeechError> {
        glog_debug!("CommandSpeech::capture program={}", self.program.display());
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(SpeechError::Failed(e.to_string())),
            Err(_) => return Err(SpeechError::Failed("timed out".to_string())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Failed(format!(
                "exit status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            return Err(SpeechError::Failed("nothing recognised".to_string()));
        }
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_missing_program() {
        assert!(CommandSpeech::resolve("definitely-not-a-real-recognizer-xyz").is_none());
        assert!(CommandSpeech::resolve("   ").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_uses_trimmed_stdout() {
        let speech = CommandSpeech::resolve("echo  check my otp status ").unwrap();
        assert_eq!(speech.capture().await.unwrap(), "check my otp status");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_reports_failure_status() {
        let speech = CommandSpeech::resolve("false").unwrap();
        assert!(matches!(
            speech.capture().await.unwrap_err(),
            SpeechError::Failed(_)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_empty_transcript_is_failure() {
        let speech = CommandSpeech::resolve("true").unwrap();
        assert_eq!(
            speech.capture().await.unwrap_err(),
            SpeechError::Failed("nothing recognised".to_string())
        );
    }
}

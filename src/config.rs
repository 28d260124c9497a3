use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{glog_debug, Error, Result};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/gemini";
pub const DEFAULT_REPLY_DELAY_MS: u64 = 600;
pub const DEFAULT_UPSTREAM: &str = "https://generativelanguage.googleapis.com";

/// Models tried in order before falling back to any `generateContent` model.
pub const PREFERRED_MODELS: [&str; 5] = [
    "models/gemini-2.5-flash",
    "models/gemini-2.5-pro",
    "models/gemini-2.0-flash",
    "models/gemini-2.0-flash-001",
    "models/gemini-2.5-flash-lite",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Assistant proxy URL used by the chat and lookup panels.
    pub endpoint: Option<String>,
    pub reply_delay_ms: Option<u64>,
    /// External program whose stdout is taken as a voice transcript.
    pub speech_command: Option<String>,
    /// TOML file replacing the builtin service catalog.
    pub services_file: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub upstream_base_url: Option<String>,
    #[serde(default)]
    pub preferred_models: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            upstream_base_url: None,
            preferred_models: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn effective_upstream(&self) -> &str {
        self.upstream_base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .unwrap_or(DEFAULT_UPSTREAM)
    }

    pub fn effective_models(&self) -> Vec<String> {
        if self.preferred_models.is_empty() {
            PREFERRED_MODELS.iter().map(|m| m.to_string()).collect()
        } else {
            self.preferred_models
                .iter()
                .map(|m| {
                    if m.starts_with("models/") {
                        m.clone()
                    } else {
                        format!("models/{}", m)
                    }
                })
                .collect()
        }
    }
}

impl Config {
    pub fn govdesk_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".govdesk"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::govdesk_dir()?.join("govdesk.toml"))
    }

    pub fn effective_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms.unwrap_or(DEFAULT_REPLY_DELAY_MS))
    }

    pub fn services_path(&self) -> Option<PathBuf> {
        self.services_file.as_deref().map(expand_tilde)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        glog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            glog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        glog_debug!(
            "Config loaded: endpoint={:?} reply_delay_ms={:?} speech={:?} services={:?}",
            config.endpoint,
            config.reply_delay_ms,
            config.speech_command,
            config.services_file
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let dir = Self::govdesk_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        glog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(Error::Validation(format!(
                    "endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }
        if self.server.port == 0 {
            return Err(Error::Validation("server.port must not be 0".to_string()));
        }
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

//! Service settings.
//!
//! Settings are read from a YAML file (`PAPERCHAT_CONFIG_PATH`, falling back
//! to `config.yml` next to the binary; a missing file yields defaults) and
//! then overlaid with environment variables for the values that are usually
//! injected at deploy time: `PORT`, `OPENAI_API_KEY`, `GOOGLE_SEARCH_API_KEY`,
//! `GOOGLE_SEARCH_ENGINE_ID`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::ChatError;

const REDACT_PLACEHOLDER: &str = "****";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub model: ModelSettings,
    pub retriever: RetrieverSettings,
    pub chat: ChatSettings,
    pub tools: ToolSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub log_dir: String,
    /// Allowed CORS origins; empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            log_dir: "logs".to_string(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverSettings {
    pub index_url: String,
    pub namespace: String,
    pub top_k: usize,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self {
            index_url: "http://127.0.0.1:6100".to_string(),
            namespace: "default".to_string(),
            top_k: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Conversation pairs kept when trimming history.
    pub history_window: usize,
    /// Compress trimmed-away history into one summary message.
    pub summarize_trimmed: bool,
    /// Agent reasoning step ceiling.
    pub max_steps: usize,
    /// Overall request budget in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history_window: 2,
            summarize_trimmed: false,
            max_steps: 6,
            request_timeout_secs: 300,
        }
    }
}

impl ChatSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub google_search_api_key: String,
    pub google_search_engine_id: String,
    /// Per-invocation tool budget, separate from the request deadline.
    pub tool_timeout_secs: u64,
    pub search_max_results: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            google_search_api_key: String::new(),
            google_search_engine_id: String::new(),
            tool_timeout_secs: 30,
            search_max_results: 3,
        }
    }
}

impl ToolSettings {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

impl Settings {
    /// Loads settings from the resolved config path plus env overrides.
    pub fn load() -> Result<Self, ChatError> {
        let mut settings = Self::from_file(&config_path())?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ChatError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    fn apply_env_overrides(&mut self) {
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.model.api_key = key;
            }
        }
        if let Ok(key) = env::var("GOOGLE_SEARCH_API_KEY") {
            if !key.is_empty() {
                self.tools.google_search_api_key = key;
            }
        }
        if let Ok(id) = env::var("GOOGLE_SEARCH_ENGINE_ID") {
            if !id.is_empty() {
                self.tools.google_search_engine_id = id;
            }
        }
    }

    /// Copy with secrets masked, for the startup log line.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.model.api_key.is_empty() {
            copy.model.api_key = REDACT_PLACEHOLDER.to_string();
        }
        if !copy.tools.google_search_api_key.is_empty() {
            copy.tools.google_search_api_key = REDACT_PLACEHOLDER.to_string();
        }
        copy
    }
}

fn config_path() -> PathBuf {
    if let Ok(path) = env::var("PAPERCHAT_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    PathBuf::from("config.yml")
}

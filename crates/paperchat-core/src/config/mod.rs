use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{defaults, paths};
use crate::error::PaperError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub summary: SummarySettings,
    #[serde(default)]
    pub notes: NoteSettings,
    #[serde(default)]
    pub zotero: ZoteroSettings,
}

/// Connection to the chat-completion / conversation-store server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub base_url: Option<String>,
    pub api_key_env: String,
    /// Inline key; the environment variable wins when both are set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteSettings {
    pub dir: Option<PathBuf>,
    pub library_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoteroSettings {
    pub storage_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: defaults::API_KEY_ENV.to_string(),
            api_key: None,
        }
    }
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            model: defaults::MODEL.to_string(),
            max_tokens: defaults::MAX_TOKENS,
            system_prompt: defaults::SYSTEM_PROMPT.to_string(),
            prompt: defaults::PROMPT.to_string(),
        }
    }
}

impl Default for NoteSettings {
    fn default() -> Self {
        Self {
            dir: None,
            library_id: defaults::LIBRARY_ID,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::APP_DIR)
            .join(paths::CONFIG_FILE)
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or does not parse.
    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Ignoring unparseable config {}: {}", path.display(), e),
                },
                Err(e) => tracing::warn!("Could not read config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<(), PaperError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), PaperError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PaperError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the API key, preferring the environment variable named in settings.
    pub fn api_key(&self) -> Option<String> {
        if !self.server.api_key_env.is_empty() {
            if let Ok(key) = std::env::var(&self.server.api_key_env) {
                if !key.trim().is_empty() {
                    return Some(key);
                }
            }
        }
        self.server
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
    }

    /// Base URL and API key, or a configuration error naming what is missing.
    pub fn server_credentials(&self) -> Result<(String, String), PaperError> {
        let base_url = self
            .server
            .base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| PaperError::Config("Server URL is not configured".into()))?;
        let api_key = self.api_key().ok_or_else(|| {
            PaperError::Config(format!(
                "API key is not configured (set {} or server.api_key)",
                self.server.api_key_env
            ))
        })?;
        Ok((base_url.to_string(), api_key))
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.notes.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(paths::APP_DIR)
                .join(paths::NOTES_DIR)
        })
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.zotero.storage_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(paths::ZOTERO_DIR)
                .join(paths::STORAGE_DIR)
        })
    }
}

use std::{collections::HashMap, fs};

use anyhow::{anyhow, Result};
use serde::Deserialize;

const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub max_output_tokens: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8000".into(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4.1-mini".into(),
            max_output_tokens: 700,
        }
    }
}

impl Settings {
    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("OPENAI_API_KEY not set"))
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    resolve_settings(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then flat string keys from `server.toml`, then environment.
/// Unparseable numbers are ignored.
pub fn resolve_settings(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("openai_base_url") {
                settings.openai_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("model") {
                settings.model = v.clone();
            }
            if let Some(v) = file_cfg.get("max_output_tokens") {
                if let Ok(parsed) = v.parse::<u32>() {
                    settings.max_output_tokens = parsed;
                }
            }
        }
    }

    for key in ["SERVER_BIND", "APP__BIND_ADDR"] {
        if let Some(v) = env(key) {
            settings.server_bind = v;
        }
    }

    for key in ["OPENAI_API_KEY", "APP__OPENAI_API_KEY"] {
        if let Some(v) = env(key) {
            settings.openai_api_key = Some(v);
        }
    }

    for key in ["OPENAI_BASE_URL", "APP__OPENAI_BASE_URL"] {
        if let Some(v) = env(key) {
            settings.openai_base_url = v;
        }
    }

    if let Some(v) = env("APP__MODEL") {
        settings.model = v;
    }

    if let Some(v) = env("APP__MAX_OUTPUT_TOKENS") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.max_output_tokens = parsed;
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

use std::{collections::HashMap, fs};

use client_core::DEFAULT_API_URL;

const SETTINGS_FILE: &str = "reader.toml";
const DEFAULT_DATABASE_URL: &str = "sqlite://./data/tarot.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderSettings {
    pub api_url: String,
    pub database_url: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            request_timeout_secs: Some(60),
        }
    }
}

pub fn load_settings() -> ReaderSettings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    resolve_settings(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then flat string keys from `reader.toml`, then environment.
/// A timeout of `0` disables the transport timeout.
pub fn resolve_settings(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ReaderSettings {
    let mut settings = ReaderSettings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("api_url") {
                settings.api_url = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
            if let Some(v) = file_cfg.get("request_timeout_secs") {
                apply_timeout(&mut settings, v);
            }
        }
    }

    for key in ["TAROT_API_URL", "APP__API_URL"] {
        if let Some(v) = env(key) {
            settings.api_url = v;
        }
    }

    for key in ["DATABASE_URL", "APP__DATABASE_URL"] {
        if let Some(v) = env(key) {
            settings.database_url = v;
        }
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        apply_timeout(&mut settings, &v);
    }

    settings
}

fn apply_timeout(settings: &mut ReaderSettings, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<u64>() {
        settings.request_timeout_secs = (parsed > 0).then_some(parsed);
    }
}

/// Turns plain file paths into `sqlite://` urls; anything with a scheme passes
/// through unchanged.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

// SPDX-License-Identifier: MPL-2.0
//! This module handles the application's configuration, including loading and saving
//! user preferences to a `settings.toml` file.
//!
//! API keys may also come from the environment (`FAL_KEY`, `GEMINI_API_KEY`);
//! the environment wins over the file.
//!
//! # Examples
//!
//! ```no_run
//! use nano_layer::config::{self, Config};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.language = Some("zh-CN".to_string());
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

use crate::app::paths;
use crate::domain::{GenerationModel, Provider};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "settings.toml";

/// Environment variable holding the fal.ai key.
pub const ENV_FAL_KEY: &str = "FAL_KEY";

/// Environment variable holding the Gemini key.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Generation backend selected in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Fal,
    Gemini,
}

impl From<ProviderKind> for Provider {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Fal => Provider::Fal,
            ProviderKind::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    /// Model id, e.g. `fal-ai/nano-banana-pro`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub fal_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub fal_base_url: Option<String>,
    #[serde(default)]
    pub gemini_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub history_page_size: Option<usize>,
    /// Default style/system instruction sent with every generation.
    #[serde(default)]
    pub system_instruction: Option<String>,
}

impl Config {
    /// Applies API keys from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies API keys from `lookup`; non-empty values replace file values.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(ENV_FAL_KEY) {
            self.fal_api_key = Some(key);
        }
        if let Some(key) = non_empty(ENV_GEMINI_API_KEY) {
            self.gemini_api_key = Some(key);
        }
        self
    }

    /// Model to generate with: the configured model if it is known, otherwise
    /// the provider's default.
    #[must_use]
    pub fn generation_model(&self) -> GenerationModel {
        if let Some(model) = self.model.as_deref().and_then(|m| m.parse().ok()) {
            return model;
        }
        if self.model.is_some() {
            tracing::warn!(model = ?self.model, "unknown model in settings, using provider default");
        }
        match self.provider.unwrap_or_default() {
            ProviderKind::Fal => GenerationModel::NanoBanana,
            ProviderKind::Gemini => GenerationModel::GeminiFlashImage,
        }
    }

    /// Request timeout, clamped to the supported range.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .request_timeout_secs
            .unwrap_or(defaults::DEFAULT_REQUEST_TIMEOUT_SECS)
            .clamp(
                defaults::MIN_REQUEST_TIMEOUT_SECS,
                defaults::MAX_REQUEST_TIMEOUT_SECS,
            );
        Duration::from_secs(secs)
    }

    /// History page size, clamped to the supported range.
    #[must_use]
    pub fn history_page_size(&self) -> usize {
        self.history_page_size
            .unwrap_or(defaults::DEFAULT_HISTORY_PAGE_SIZE)
            .clamp(
                defaults::MIN_HISTORY_PAGE_SIZE,
                defaults::MAX_HISTORY_PAGE_SIZE,
            )
    }

    #[must_use]
    pub fn fal_base_url(&self) -> &str {
        self.fal_base_url
            .as_deref()
            .unwrap_or(defaults::DEFAULT_FAL_BASE_URL)
    }

    #[must_use]
    pub fn gemini_base_url(&self) -> &str {
        self.gemini_base_url
            .as_deref()
            .unwrap_or(defaults::DEFAULT_GEMINI_BASE_URL)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    paths::get_app_config_dir().map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads `settings.toml` from the config directory, or defaults if absent.
pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Reads a settings file. Unparseable TOML yields the defaults.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "invalid settings file, using defaults");
            Ok(Config::default())
        }
    }
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

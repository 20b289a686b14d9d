// SPDX-License-Identifier: MPL-2.0
//! Application state persistence using CBOR format.
//!
//! Session state that is not user-configurable (unlike `settings.toml`):
//! recently used directories and the last generation options. Loading never
//! fails hard; problems are reported as a notification key and the default
//! state is used instead.

use super::paths;
use crate::application::editor::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// State file name within the app data directory.
const STATE_FILE: &str = "state.cbor";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppState {
    /// Last directory an image or document was opened from.
    #[serde(default)]
    pub last_open_directory: Option<PathBuf>,

    /// Last directory a flattened image was exported to.
    #[serde(default)]
    pub last_export_directory: Option<PathBuf>,

    /// Stored as strings so an unknown value from a newer build is skipped
    /// rather than failing the whole file.
    #[serde(default)]
    pub last_aspect_ratio: Option<String>,

    #[serde(default)]
    pub last_resolution: Option<String>,

    #[serde(default)]
    pub last_style_instruction: Option<String>,

    #[serde(default)]
    pub crop_to_selection: bool,

    /// Model id used for the last generation.
    #[serde(default)]
    pub last_model: Option<String>,
}

impl AppState {
    /// Loads state from the default data directory.
    ///
    /// Returns the state and an optional notification key describing why
    /// the defaults were used.
    pub fn load() -> (Self, Option<String>) {
        Self::load_from(None)
    }

    /// Loads state from `base_dir`, or the default data directory if `None`.
    pub fn load_from(base_dir: Option<PathBuf>) -> (Self, Option<String>) {
        let Some(path) = Self::state_file_path_with_override(base_dir) else {
            return (Self::default(), None);
        };

        if !path.exists() {
            return (Self::default(), None);
        }

        match fs::File::open(&path) {
            Ok(file) => match ciborium::from_reader(BufReader::new(file)) {
                Ok(state) => (state, None),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "state file is corrupted");
                    (
                        Self::default(),
                        Some("notification-state-parse-error".to_string()),
                    )
                }
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read state file");
                (
                    Self::default(),
                    Some("notification-state-read-error".to_string()),
                )
            }
        }
    }

    /// Saves state to the default data directory.
    pub fn save(&self) -> Option<String> {
        self.save_to(None)
    }

    /// Saves state to `base_dir`, creating it if needed.
    ///
    /// Returns a notification key on failure.
    pub fn save_to(&self, base_dir: Option<PathBuf>) -> Option<String> {
        let Some(path) = Self::state_file_path_with_override(base_dir) else {
            return Some("notification-state-path-error".to_string());
        };

        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return Some("notification-state-dir-error".to_string());
            }
        }

        match fs::File::create(&path) {
            Ok(file) => {
                if ciborium::into_writer(self, BufWriter::new(file)).is_err() {
                    return Some("notification-state-write-error".to_string());
                }
                None
            }
            Err(_) => Some("notification-state-create-error".to_string()),
        }
    }

    fn state_file_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
        paths::get_app_data_dir_with_override(base_dir).map(|mut path| {
            path.push(STATE_FILE);
            path
        })
    }

    /// Remembers the parent directory of an opened file. Root paths are ignored.
    pub fn set_last_open_directory_from_file(&mut self, file_path: &Path) {
        if let Some(parent) = file_path.parent() {
            self.last_open_directory = Some(parent.to_path_buf());
        }
    }

    /// Remembers the parent directory of an exported file. Root paths are ignored.
    pub fn set_last_export_directory_from_file(&mut self, file_path: &Path) {
        if let Some(parent) = file_path.parent() {
            self.last_export_directory = Some(parent.to_path_buf());
        }
    }

    /// Restores the last generation options. Unknown values are dropped.
    #[must_use]
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            style_instruction: self.last_style_instruction.clone(),
            aspect_ratio: self
                .last_aspect_ratio
                .as_deref()
                .and_then(|s| s.parse().ok()),
            resolution: self.last_resolution.as_deref().and_then(|s| s.parse().ok()),
            crop_to_selection: self.crop_to_selection,
        }
    }

    pub fn remember_generation_options(&mut self, options: &GenerationOptions) {
        self.last_style_instruction = options.style_instruction.clone();
        self.last_aspect_ratio = options.aspect_ratio.map(|a| a.as_str().to_string());
        self.last_resolution = options.resolution.map(|r| r.as_str().to_string());
        self.crop_to_selection = options.crop_to_selection;
    }
}

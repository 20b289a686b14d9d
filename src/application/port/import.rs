// SPDX-License-Identifier: MPL-2.0
//! Document import port definition.

use crate::domain::{CanvasSize, Layer};
use std::path::Path;

/// A decoded document: canvas size plus its layers, bottom first.
#[derive(Debug, Clone)]
pub struct ImportedDocument {
    pub size: CanvasSize,
    pub layers: Vec<Layer>,
}

/// Errors that can occur during import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Recognized but unsupported container (e.g. layered PSD).
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode document: {0}")]
    Decode(String),
}

impl ImportError {
    /// Returns the i18n key for this error.
    #[must_use]
    pub fn i18n_key(&self) -> &'static str {
        match self {
            ImportError::UnsupportedFormat(_) => "notification-import-unsupported",
            ImportError::Io(_) => "notification-import-io-error",
            ImportError::Decode(_) => "notification-import-decode-error",
        }
    }
}

/// Port for opening documents.
pub trait FileImporter: Send + Sync {
    /// Imports a document from disk.
    ///
    /// # Errors
    ///
    /// Returns an [`ImportError`] when the file cannot be read or decoded.
    fn import_path(&self, path: &Path) -> Result<ImportedDocument, ImportError>;

    /// Imports a document from memory. `name` names the resulting layer.
    ///
    /// # Errors
    ///
    /// Returns an [`ImportError`] when the bytes cannot be decoded.
    fn import_bytes(&self, name: &str, bytes: &[u8]) -> Result<ImportedDocument, ImportError>;
}

// SPDX-License-Identifier: MPL-2.0
//! Crate-level error type.
//!
//! Each layer keeps its own error enum; this one wraps them so the binary and
//! the settings code can use a single `Result`.

use crate::application::port::{CodecError, GenerationError, HistoryError, ImportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl Error {
    /// Returns the i18n message key for this error.
    #[must_use]
    pub fn i18n_key(&self) -> &'static str {
        match self {
            Error::Io(_) => "error-io",
            Error::Config(_) => "error-config",
            Error::Codec(err) => err.i18n_key(),
            Error::Import(err) => err.i18n_key(),
            Error::Generation(err) => err.i18n_key(),
            Error::History(err) => err.i18n_key(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`. These adapters wrap external dependencies like the
//! `image` crate, the fal.ai and Gemini HTTP APIs, and the file system.
//!
//! # Available Adapters
//!
//! - [`codec`]: Bitmap codec via `image` (implements [`BitmapCodec`])
//! - [`import`]: Raster file import (implements [`FileImporter`])
//! - [`fal`]: fal.ai generation (implements [`ImageGenerator`])
//! - [`gemini`]: Gemini generation and analysis (implements [`ImageGenerator`] and [`ImageAnalyzer`])
//! - [`history`]: On-disk generation log (implements [`HistoryStore`])
//!
//! [`BitmapCodec`]: crate::application::port::BitmapCodec
//! [`FileImporter`]: crate::application::port::FileImporter
//! [`ImageAnalyzer`]: crate::application::port::ImageAnalyzer
//! [`HistoryStore`]: crate::application::port::HistoryStore

pub mod codec;
pub mod fal;
pub mod gemini;
pub mod history;
mod http;
pub mod import;

// Re-export main types for convenience
pub use codec::ImageRsCodec;
pub use fal::FalClient;
pub use gemini::GeminiClient;
pub use history::FileHistoryStore;
pub use import::ImageFileImporter;

use crate::application::port::{
    GenerationError, GenerationOutcome, GenerationRequest, ImageGenerator,
};
use crate::config::Config;
use crate::domain::{GenerationModel, Provider};

/// Generator chosen by the model's provider.
#[derive(Debug, Clone)]
pub enum ConfiguredGenerator {
    Fal(FalClient),
    Gemini(GeminiClient),
}

impl ConfiguredGenerator {
    /// Builds the client for `model`, or for the configured model when
    /// `model` is `None`.
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be built.
    pub fn from_config(
        config: &Config,
        model: Option<GenerationModel>,
    ) -> Result<Self, GenerationError> {
        let model = model.unwrap_or_else(|| config.generation_model());
        tracing::debug!(model = model.id(), "configuring generator");
        Ok(match model.provider() {
            Provider::Fal => ConfiguredGenerator::Fal(FalClient::from_config(config, model)?),
            Provider::Gemini => {
                ConfiguredGenerator::Gemini(GeminiClient::from_config(config, model)?)
            }
        })
    }
}

impl ImageGenerator for ConfiguredGenerator {
    fn model(&self) -> GenerationModel {
        match self {
            ConfiguredGenerator::Fal(client) => client.model(),
            ConfiguredGenerator::Gemini(client) => client.model(),
        }
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        match self {
            ConfiguredGenerator::Fal(client) => client.generate(request).await,
            ConfiguredGenerator::Gemini(client) => client.generate(request).await,
        }
    }
}

/// Analysis always goes to Gemini, whichever provider generates.
///
/// # Errors
///
/// Returns a network error if the HTTP client cannot be built.
pub fn analyzer_from_config(config: &Config) -> Result<GeminiClient, GenerationError> {
    GeminiClient::from_config(config, GenerationModel::GeminiFlashImage)
}

// SPDX-License-Identifier: MPL-2.0
//! Image generation port definition.
//!
//! This module defines the [`ImageGenerator`] and [`ImageAnalyzer`] traits.
//! Adapters decode the providers' loosely-typed JSON once, at their own
//! boundary, and hand back either a [`GenerationOutcome`] or a tagged
//! [`GenerationError`]; the orchestrator never inspects raw payloads.
//!
//! # Design Notes
//!
//! - Requests own (cheaply cloned) bitmaps captured at build time, so later
//!   edits to the layer stack cannot affect a request in flight
//! - Timeouts are the adapter's responsibility

use crate::domain::{AspectRatio, Bitmap, GenerationModel, RelativeRegion, ResolutionTier};
use std::future::Future;

// =============================================================================
// GenerationRequest
// =============================================================================

/// Everything a provider needs to create or edit one image.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// User prompt, never empty once built by the orchestrator.
    pub prompt: String,
    /// Image being edited. `None` means text-to-image.
    pub base_image: Option<Bitmap>,
    /// Context images, in stacking order.
    pub reference_images: Vec<Bitmap>,
    /// Part of `base_image` the edit should be confined to.
    pub region_hint: Option<RelativeRegion>,
    pub style_instruction: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
    pub resolution: Option<ResolutionTier>,
}

impl GenerationRequest {
    /// Creates a text-to-image request.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Whether this request edits an existing image.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        self.base_image.is_some()
    }

    /// Prompt rewritten to confine the change to [`Self::region_hint`].
    ///
    /// Returns the prompt unchanged when there is no region hint.
    #[must_use]
    pub fn region_prompt(&self) -> String {
        match self.region_hint {
            Some(region) => format!(
                "Modify only the specific region located at approximately \
                 (X:{}%, Y:{}%) with size (W:{}%, H:{}%) in the provided image. \
                 Change that specific area to: {}. IMPORTANT: Everything outside \
                 this selection MUST remain exactly 100% identical to the original \
                 image background.",
                region.x, region.y, region.width, region.height, self.prompt
            ),
            None => self.prompt.clone(),
        }
    }

    /// `prompt` followed by a note about attached reference images, if any.
    #[must_use]
    pub fn with_reference_note(&self, prompt: &str) -> String {
        match self.reference_images.len() {
            0 => prompt.to_string(),
            n => format!(
                "{prompt} (Use the provided {n} reference image(s) as style/content context)"
            ),
        }
    }

    /// Resolution tier to forward to `model`, if it accepts one.
    #[must_use]
    pub fn resolution_for(&self, model: GenerationModel) -> Option<ResolutionTier> {
        self.resolution.filter(|_| model.supports_resolution())
    }
}

// =============================================================================
// GenerationOutcome
// =============================================================================

/// Successful provider response.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub image: Bitmap,
    /// Estimated price of the call in USD.
    pub cost_estimate: Option<f64>,
    /// Provider-side request identifier, when one is returned.
    pub request_id: Option<String>,
}

// =============================================================================
// GenerationError
// =============================================================================

/// Classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// No API key configured for the provider.
    MissingCredentials,
    /// Transport failure (DNS, TLS, timeout, connection reset).
    Network,
    /// Provider returned a non-success status.
    Api { status: u16 },
    /// Rate limit or billing quota exhausted.
    Quota,
    /// Response image could not be decoded.
    Decode,
    /// Provider answered but produced no image.
    EmptyResponse,
}

/// Tagged provider error. `message` is passed to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Decode, message)
    }

    /// Maps an HTTP error status to the matching kind.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let kind = match status {
            429 => GenerationErrorKind::Quota,
            _ => GenerationErrorKind::Api { status },
        };
        Self::new(kind, body)
    }

    /// Returns the i18n key for this error kind.
    #[must_use]
    pub fn i18n_key(&self) -> &'static str {
        match self.kind {
            GenerationErrorKind::MissingCredentials => "notification-generation-missing-key",
            GenerationErrorKind::Network => "notification-generation-network-error",
            GenerationErrorKind::Api { .. } => "notification-generation-api-error",
            GenerationErrorKind::Quota => "notification-generation-quota-error",
            GenerationErrorKind::Decode => "notification-generation-decode-error",
            GenerationErrorKind::EmptyResponse => "notification-generation-empty-response",
        }
    }
}

// =============================================================================
// Ports
// =============================================================================

/// Port for remote image generation and editing.
///
/// # Example
///
/// ```ignore
/// use nano_layer::application::port::{GenerationRequest, ImageGenerator};
///
/// async fn sketch(generator: &impl ImageGenerator) {
///     let request = GenerationRequest::new("a lighthouse at dusk");
///     match generator.generate(&request).await {
///         Ok(outcome) => println!("{}x{}", outcome.image.width(), outcome.image.height()),
///         Err(err) => eprintln!("{err}"),
///     }
/// }
/// ```
pub trait ImageGenerator: Send + Sync {
    /// Model used for requests sent through this generator.
    fn model(&self) -> GenerationModel;

    /// Creates (text-to-image) or edits (image-to-image) one image.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] describing the failure. No partial
    /// result is ever returned.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<GenerationOutcome, GenerationError>> + Send;
}

/// Port for image understanding (text answers about an image).
pub trait ImageAnalyzer: Send + Sync {
    /// Describes `image` according to `prompt`.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] when the provider call fails.
    fn analyze(
        &self,
        image: &Bitmap,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

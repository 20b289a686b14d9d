// SPDX-License-Identifier: MPL-2.0
//! Bitmap codec port definition.
//!
//! Turns encoded image bytes (files, API payloads) into [`Bitmap`]s and back.
//! The trait is object-safe so the orchestrator can hold it as
//! `Arc<dyn BitmapCodec>`.

use crate::domain::Bitmap;
use std::fmt;

/// Encodings the editor can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::WebP => "webp",
        }
    }

    /// Guesses the format from a file extension (case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Errors that can occur while decoding or encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

impl CodecError {
    /// Returns the i18n key for this error.
    #[must_use]
    pub fn i18n_key(&self) -> &'static str {
        match self {
            CodecError::UnsupportedFormat => "error-codec-unsupported-format",
            CodecError::InvalidDimensions { .. } => "error-codec-invalid-dimensions",
            CodecError::Decode(_) => "error-codec-decode",
            CodecError::Encode(_) => "error-codec-encode",
        }
    }
}

/// Port for pixel encoding and decoding.
pub trait BitmapCodec: Send + Sync {
    /// Decodes any supported format into RGBA8.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] for corrupt data and
    /// [`CodecError::UnsupportedFormat`] for unknown formats.
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, CodecError>;

    /// Encodes a bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the encoder fails.
    fn encode(&self, bitmap: &Bitmap, format: ImageFormat) -> Result<Vec<u8>, CodecError>;

    /// Resamples to exactly `width` x `height` (aspect ratio not preserved).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidDimensions`] for a zero target.
    fn resize(&self, bitmap: &Bitmap, width: u32, height: u32) -> Result<Bitmap, CodecError>;

    /// Downscales so the longest edge is at most `max_edge`, preserving aspect
    /// ratio. Smaller images are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if resampling fails.
    fn thumbnail(&self, bitmap: &Bitmap, max_edge: u32) -> Result<Bitmap, CodecError> {
        let (width, height) = bitmap.dimensions();
        if width <= max_edge && height <= max_edge {
            return Ok(bitmap.clone());
        }
        let (w, h) = fit_within(width, height, max_edge);
        self.resize(bitmap, w, h)
    }
}

/// Dimensions of `width` x `height` scaled so the longest edge is `max_edge`.
/// Each axis stays at least one pixel.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height).max(1) as f64;
    let scale = f64::from(max_edge) / longest;
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w, h)
}

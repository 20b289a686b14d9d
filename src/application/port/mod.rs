// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters implement.
//! These traits use only domain types, so the editor core can be exercised
//! against mocks without a network, a codec or a disk.
//!
//! # Available Ports
//!
//! - [`generation`]: Remote image generation and analysis
//! - [`codec`]: Bitmap encoding, decoding and resampling
//! - [`history`]: Append-only generation log
//! - [`import`]: Document import
//!
//! # Design Notes
//!
//! - Network-bound ports return `impl Future + Send` so adapters can use `async fn`
//! - Codec, history and import are synchronous; they run between awaits
//! - Every error type exposes an `i18n_key()` for user-facing notifications

pub mod codec;
pub mod generation;
pub mod history;
pub mod import;

// Re-export main types for convenience
pub use codec::{BitmapCodec, CodecError, ImageFormat};
pub use generation::{
    GenerationError, GenerationErrorKind, GenerationOutcome, GenerationRequest, ImageAnalyzer,
    ImageGenerator,
};
pub use history::{HistoryError, HistoryPage, HistoryRecord, HistoryStore, NewHistoryRecord};
pub use import::{FileImporter, ImportError, ImportedDocument};

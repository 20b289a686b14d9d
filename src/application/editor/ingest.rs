// SPDX-License-Identifier: MPL-2.0
//! Getting pixels into and out of the editor: paste, import, history and
//! export.
//!
//! Every entry point decodes fully before touching [`EditorState`], so a
//! decode failure never leaves a partial layer behind.

use super::compositor;
use super::state::{EditorCommand, EditorState};
use crate::application::port::{
    BitmapCodec, CodecError, FileImporter, HistoryError, HistoryRecord, HistoryStore, ImageFormat,
    ImportError,
};
use crate::domain::{Bitmap, Layer, LayerId};
use std::path::Path;

/// Number of prompt characters kept in history layer names.
const NAME_PROMPT_CHARS: usize = 15;

/// Failure while loading a history record back onto the canvas.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl LoadError {
    #[must_use]
    pub fn i18n_key(&self) -> &'static str {
        match self {
            LoadError::History(err) => err.i18n_key(),
            LoadError::Codec(err) => err.i18n_key(),
        }
    }
}

/// Decodes `bytes` and adds them as a new, centered layer.
///
/// The canvas grows to fit the image.
///
/// # Errors
///
/// Returns a [`CodecError`] if the bytes are not a decodable, non-empty image.
pub fn paste_bytes(
    state: &mut EditorState,
    codec: &dyn BitmapCodec,
    name: &str,
    bytes: &[u8],
    thumbnail_edge: u32,
) -> Result<LayerId, CodecError> {
    let bitmap = decode_non_empty(codec, bytes)?;
    let layer = with_thumbnail(Layer::new(name, bitmap), codec, thumbnail_edge);
    let id = state.add_image_layer(layer);
    tracing::debug!(%id, name, "pasted image layer");
    Ok(id)
}

/// Replaces the document with the file at `path`.
///
/// # Errors
///
/// Returns an [`ImportError`]; the current document is kept on failure.
pub fn import_document(
    state: &mut EditorState,
    importer: &dyn FileImporter,
    path: &Path,
) -> Result<(), ImportError> {
    let document = importer.import_path(path)?;
    tracing::info!(
        path = %path.display(),
        layers = document.layers.len(),
        width = document.size.width,
        height = document.size.height,
        "document imported"
    );
    state.apply(EditorCommand::LoadDocument(document));
    Ok(())
}

/// Adds a stored generation as a new layer named after its prompt.
///
/// # Errors
///
/// Returns a [`LoadError`] if the image is missing or cannot be decoded.
pub fn load_history_record(
    state: &mut EditorState,
    store: &dyn HistoryStore,
    codec: &dyn BitmapCodec,
    record: &HistoryRecord,
    thumbnail_edge: u32,
) -> Result<LayerId, LoadError> {
    let bytes = store.load_image(record)?;
    let bitmap = decode_non_empty(codec, &bytes)?;
    let prefix: String = record.prompt.chars().take(NAME_PROMPT_CHARS).collect();
    let layer = Layer::new(format!("History: {prefix}..."), bitmap)
        .with_cost(record.cost)
        .with_prompt(record.prompt.clone());
    let layer = with_thumbnail(layer, codec, thumbnail_edge);
    Ok(state.add_image_layer(layer))
}

/// Flattens the visible layers and encodes them.
///
/// # Errors
///
/// Returns [`CodecError::InvalidDimensions`] for an empty canvas, or the
/// encoder's error.
pub fn export(
    state: &EditorState,
    codec: &dyn BitmapCodec,
    format: ImageFormat,
) -> Result<Vec<u8>, CodecError> {
    let canvas = state.canvas();
    if canvas.is_empty() {
        return Err(CodecError::InvalidDimensions {
            width: canvas.width,
            height: canvas.height,
        });
    }
    let flattened = compositor::export_flattened(state.layers(), canvas.width, canvas.height);
    codec.encode(&flattened, format)
}

fn decode_non_empty(codec: &dyn BitmapCodec, bytes: &[u8]) -> Result<Bitmap, CodecError> {
    let bitmap = codec.decode(bytes)?;
    if bitmap.is_empty() {
        return Err(CodecError::InvalidDimensions {
            width: bitmap.width(),
            height: bitmap.height(),
        });
    }
    Ok(bitmap)
}

fn with_thumbnail(layer: Layer, codec: &dyn BitmapCodec, max_edge: u32) -> Layer {
    match codec.thumbnail(layer.bitmap(), max_edge) {
        Ok(preview) => layer.with_preview(preview),
        Err(err) => {
            tracing::debug!(error = %err, "thumbnail generation failed");
            layer
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
//! [`FileImporter`] for flat raster files.
//!
//! A raster file becomes a one-layer document the size of the image.
//! Photoshop documents are recognized (by extension or `8BPS` signature)
//! and rejected; layered PSD decoding is not supported.

use super::codec::ImageRsCodec;
use crate::application::port::{
    BitmapCodec, CodecError, FileImporter, ImportError, ImportedDocument,
};
use crate::config::defaults;
use crate::domain::{CanvasSize, Layer};
use std::path::Path;

const PSD_SIGNATURE: &[u8; 4] = b"8BPS";

#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileImporter {
    codec: ImageRsCodec,
}

impl ImageFileImporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_psd(name: &str, bytes: &[u8]) -> bool {
    let by_extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("psd"));
    by_extension || bytes.starts_with(PSD_SIGNATURE)
}

impl FileImporter for ImageFileImporter {
    fn import_path(&self, path: &Path) -> Result<ImportedDocument, ImportError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("image");
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name);
        if is_psd(file_name, &bytes) {
            return Err(ImportError::UnsupportedFormat(file_name.to_string()));
        }
        self.import_bytes(name, &bytes)
    }

    fn import_bytes(&self, name: &str, bytes: &[u8]) -> Result<ImportedDocument, ImportError> {
        if is_psd(name, bytes) {
            return Err(ImportError::UnsupportedFormat(name.to_string()));
        }
        let bitmap = self.codec.decode(bytes).map_err(|err| match err {
            CodecError::UnsupportedFormat => ImportError::UnsupportedFormat(name.to_string()),
            other => ImportError::Decode(other.to_string()),
        })?;
        if bitmap.is_empty() {
            return Err(ImportError::Decode(format!("{name}: image has no pixels")));
        }

        let (width, height) = bitmap.dimensions();
        let mut layer = Layer::new(name, bitmap);
        match self.codec.thumbnail(layer.bitmap(), defaults::THUMBNAIL_MAX_EDGE) {
            Ok(preview) => layer = layer.with_preview(preview),
            Err(err) => tracing::debug!(error = %err, "thumbnail generation failed"),
        }

        Ok(ImportedDocument {
            size: CanvasSize::new(width, height),
            layers: vec![layer],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port::ImageFormat;
    use crate::domain::{Bitmap, CanvasPoint};
    use tempfile::tempdir;

    #[test]
    fn png_file_becomes_single_layer_document() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("photo.png");
        let bytes = ImageRsCodec
            .encode(&Bitmap::filled(800, 600, [10, 20, 30, 255]), ImageFormat::Png)
            .unwrap();
        std::fs::write(&path, bytes).unwrap();

        let document = ImageFileImporter::new().import_path(&path).unwrap();

        assert_eq!(document.size, CanvasSize::new(800, 600));
        assert_eq!(document.layers.len(), 1);
        let layer = &document.layers[0];
        assert_eq!(layer.name(), "photo");
        assert_eq!(layer.position(), CanvasPoint::new(0.0, 0.0));
        assert_eq!(layer.bitmap().dimensions(), (800, 600));
        assert!(layer.is_visible());
        assert_eq!(layer.preview().map(Bitmap::dimensions), Some((80, 60)));
    }

    #[test]
    fn psd_is_rejected_by_extension_and_signature() {
        let importer = ImageFileImporter::new();
        assert!(matches!(
            importer.import_bytes("art.PSD", b"whatever"),
            Err(ImportError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            importer.import_bytes("renamed", b"8BPS\x00\x01rest"),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().expect("create temp dir");
        let err = ImageFileImporter::new()
            .import_path(&dir.path().join("missing.png"))
            .unwrap_err();
        assert_eq!(err.i18n_key(), "notification-import-io-error");
    }
}

// SPDX-License-Identifier: MPL-2.0
//! Test utilities for float comparisons and in-memory collaborators.
//!
//! This module re-exports the `approx` crate's assertion macro for float comparison,
//! which properly handles floating-point precision issues that `assert_eq!` cannot.

// Re-export the approx macro for convenient use in tests
pub use approx::assert_abs_diff_eq;

use crate::application::port::history::paginate;
use crate::application::port::{
    BitmapCodec, CodecError, HistoryError, HistoryPage, HistoryRecord, HistoryStore, ImageFormat,
    NewHistoryRecord,
};
use crate::domain::Bitmap;
use chrono::Utc;

const STUB_MAGIC: &[u8; 4] = b"STUB";

/// Codec with a trivial container (`STUB`, width, height, raw RGBA) and
/// nearest-neighbor resizing. Lets editor tests run without image-rs.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubCodec;

impl StubCodec {
    pub fn bytes_for(bitmap: &Bitmap) -> Vec<u8> {
        let mut out = STUB_MAGIC.to_vec();
        out.extend_from_slice(&bitmap.width().to_le_bytes());
        out.extend_from_slice(&bitmap.height().to_le_bytes());
        out.extend_from_slice(bitmap.rgba_bytes());
        out
    }
}

impl BitmapCodec for StubCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, CodecError> {
        let body = bytes
            .strip_prefix(STUB_MAGIC.as_slice())
            .filter(|body| body.len() >= 8)
            .ok_or_else(|| CodecError::Decode("not a stub image".into()))?;
        let width = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        let height = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
        Bitmap::try_from_rgba(width, height, body[8..].to_vec())
            .ok_or_else(|| CodecError::Decode("truncated pixel data".into()))
    }

    fn encode(&self, bitmap: &Bitmap, _format: ImageFormat) -> Result<Vec<u8>, CodecError> {
        Ok(Self::bytes_for(bitmap))
    }

    fn resize(&self, bitmap: &Bitmap, width: u32, height: u32) -> Result<Bitmap, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidDimensions { width, height });
        }
        let (src_w, src_h) = bitmap.dimensions();
        let mut out = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let sx = (u64::from(x) * u64::from(src_w) / u64::from(width)) as u32;
                let sy = (u64::from(y) * u64::from(src_h) / u64::from(height)) as u32;
                out.extend_from_slice(&bitmap.pixel(sx, sy).unwrap_or([0, 0, 0, 0]));
            }
        }
        Ok(Bitmap::from_rgba(width, height, out))
    }
}

/// History store kept in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Vec<(HistoryRecord, Vec<u8>)>,
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, record: NewHistoryRecord) -> Result<HistoryRecord, HistoryError> {
        let id = self.entries.len() as u64 + 1;
        let stored = HistoryRecord {
            id,
            prompt: record.prompt,
            model: record.model,
            image_ref: format!("mem-{id}"),
            thumbnail_ref: None,
            cost: record.cost,
            width: record.width,
            height: record.height,
            aspect_ratio: record.aspect_ratio,
            resolution: record.resolution,
            request_id: record.request_id,
            created_at: Utc::now(),
        };
        self.entries.push((stored.clone(), record.image_png));
        Ok(stored)
    }

    fn list(&self, page: usize, page_size: usize) -> Result<HistoryPage, HistoryError> {
        let records: Vec<HistoryRecord> = self.entries.iter().map(|(r, _)| r.clone()).collect();
        Ok(paginate(&records, page, page_size))
    }

    fn load_image(&self, record: &HistoryRecord) -> Result<Vec<u8>, HistoryError> {
        self.entries
            .iter()
            .find(|(r, _)| r.id == record.id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or(HistoryError::NotFound(record.id))
    }
}

// SPDX-License-Identifier: MPL-2.0
//! Owned RGBA raster buffer.
//!
//! [`Bitmap`] is the platform-independent pixel store behind every layer. It
//! carries no drawing context: compositing lives in the application layer and
//! encoding/decoding is delegated to a [`BitmapCodec`](crate::application::port::BitmapCodec).

use super::geometry::PixelRegion;
use std::sync::Arc;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Immutable RGBA8 pixel buffer with intrinsic dimensions.
///
/// Pixel data is shared behind an [`Arc`], so cloning a bitmap (for example to
/// capture it in a pending generation request) never copies pixels.
///
/// # Example
///
/// ```
/// use nano_layer::domain::Bitmap;
///
/// let red = Bitmap::filled(4, 2, [255, 0, 0, 255]);
/// assert_eq!(red.dimensions(), (4, 2));
/// assert_eq!(red.pixel(3, 1), Some([255, 0, 0, 255]));
/// assert_eq!(red.pixel(4, 0), None);
/// ```
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba_bytes: Arc<Vec<u8>>,
}

impl Bitmap {
    /// Creates a bitmap from dimensions and shared RGBA pixel data.
    ///
    /// # Panics
    ///
    /// Panics if the pixel data length doesn't match `width * height * 4`.
    #[must_use]
    pub fn new(width: u32, height: u32, rgba_bytes: Arc<Vec<u8>>) -> Self {
        let expected_len = buffer_len(width, height);
        assert_eq!(
            rgba_bytes.len(),
            expected_len,
            "RGBA data length mismatch: expected {expected_len}, got {}",
            rgba_bytes.len()
        );

        Self {
            width,
            height,
            rgba_bytes,
        }
    }

    /// Creates a bitmap from dimensions and owned RGBA pixel data.
    ///
    /// # Panics
    ///
    /// Panics if the pixel data length doesn't match `width * height * 4`.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, rgba_bytes: Vec<u8>) -> Self {
        Self::new(width, height, Arc::new(rgba_bytes))
    }

    /// Non-panicking variant of [`Bitmap::from_rgba`] for data coming from
    /// outside the process (decoders, network payloads).
    #[must_use]
    pub fn try_from_rgba(width: u32, height: u32, rgba_bytes: Vec<u8>) -> Option<Self> {
        (rgba_bytes.len() == buffer_len(width, height)).then(|| Self {
            width,
            height,
            rgba_bytes: Arc::new(rgba_bytes),
        })
    }

    /// Fully transparent bitmap.
    #[must_use]
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::from_rgba(width, height, vec![0; buffer_len(width, height)])
    }

    /// Bitmap where every pixel has the given RGBA value.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat((width as usize) * (height as usize));
        Self::from_rgba(width, height, pixels)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// A bitmap with no pixels is treated as absent by consumers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns a reference to the RGBA pixel data (row-major, 4 bytes per pixel).
    #[must_use]
    pub fn rgba_bytes(&self) -> &[u8] {
        &self.rgba_bytes
    }

    /// Returns the total number of pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Reads one pixel, or `None` when out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + x as usize) * BYTES_PER_PIXEL;
        let px = &self.rgba_bytes[offset..offset + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Copies a sub-rectangle into a new bitmap of exactly `region`'s size.
    ///
    /// The region is expressed in this bitmap's pixel space and may extend past
    /// its edges (or start at negative coordinates); uncovered pixels are
    /// transparent. The source is never modified.
    #[must_use]
    pub fn crop(&self, region: PixelRegion) -> Bitmap {
        let mut out = vec![0u8; buffer_len(region.width, region.height)];

        let src_w = i64::from(self.width);
        let src_h = i64::from(self.height);
        let x0 = region.x.max(0);
        let y0 = region.y.max(0);
        let x1 = (region.x + i64::from(region.width)).min(src_w);
        let y1 = (region.y + i64::from(region.height)).min(src_h);

        if x0 < x1 && y0 < y1 {
            // All four bounds were clamped into the source, so the casts are lossless.
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let run = ((x1 - x0) as usize) * BYTES_PER_PIXEL;
            for sy in y0..y1 {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let src_offset = ((sy * src_w + x0) as usize) * BYTES_PER_PIXEL;
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let dst_offset = (((sy - region.y) * i64::from(region.width) + (x0 - region.x))
                    as usize)
                    * BYTES_PER_PIXEL;
                out[dst_offset..dst_offset + run]
                    .copy_from_slice(&self.rgba_bytes[src_offset..src_offset + run]);
            }
        }

        Bitmap::from_rgba(region.width, region.height, out)
    }

    /// Consumes the bitmap and returns its pixel data, copying only if the
    /// buffer is still shared.
    #[must_use]
    pub fn into_rgba(self) -> Vec<u8> {
        Arc::try_unwrap(self.rgba_bytes).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.rgba_bytes == other.rgba_bytes
    }
}

impl Eq for Bitmap {}

fn buffer_len(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize) * BYTES_PER_PIXEL
}

// SPDX-License-Identifier: MPL-2.0
//! Layer compositing.
//!
//! Flattens an ordered set of layers into one bitmap. Layers are drawn bottom
//! to top by stacking index with source-over blending; each layer's opacity
//! scales its alpha for that layer only, so opacity never compounds across
//! layers.

use crate::domain::bitmap::BYTES_PER_PIXEL;
use crate::domain::{Bitmap, CanvasSize, Layer};

/// Renders `layers` onto a transparent canvas of the given size.
///
/// Hidden layers, fully transparent layers and layers without pixels are
/// skipped. Fractional positions are rounded to the nearest pixel; parts of a
/// layer outside the canvas are clipped.
///
/// # Example
///
/// ```
/// use nano_layer::application::editor::compositor::render;
/// use nano_layer::domain::{Bitmap, CanvasSize, Layer};
///
/// let layers = [Layer::new("red", Bitmap::filled(2, 2, [255, 0, 0, 255]))];
/// let flat = render(&layers, CanvasSize::new(4, 4));
/// assert_eq!(flat.pixel(1, 1), Some([255, 0, 0, 255]));
/// assert_eq!(flat.pixel(3, 3), Some([0, 0, 0, 0]));
/// ```
#[must_use]
pub fn render(layers: &[Layer], canvas: CanvasSize) -> Bitmap {
    let mut surface = Surface::new(canvas);
    if canvas.is_empty() {
        return surface.into_bitmap();
    }

    let mut ordered: Vec<&Layer> = layers.iter().collect();
    // Stable: equal indices keep slice order.
    ordered.sort_by_key(|layer| layer.z_index());

    for layer in ordered {
        if !layer.is_visible() || layer.opacity().is_transparent() || layer.bitmap().is_empty() {
            continue;
        }
        surface.draw(layer);
    }

    surface.into_bitmap()
}

/// Flattens for export. Same algorithm as [`render`], without any overlay.
#[must_use]
pub fn export_flattened(layers: &[Layer], width: u32, height: u32) -> Bitmap {
    render(layers, CanvasSize::new(width, height))
}

/// RGBA8 destination buffer.
struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    fn new(canvas: CanvasSize) -> Self {
        let len = (canvas.width as usize) * (canvas.height as usize) * BYTES_PER_PIXEL;
        Self {
            width: canvas.width,
            height: canvas.height,
            pixels: vec![0; len],
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw(&mut self, layer: &Layer) {
        let bitmap = layer.bitmap();
        let position = layer.position();
        let opacity = layer.opacity().value();
        if !position.x.is_finite() || !position.y.is_finite() {
            return;
        }
        let origin_x = position.x.round() as i64;
        let origin_y = position.y.round() as i64;

        let dst_w = i64::from(self.width);
        let dst_h = i64::from(self.height);
        let x0 = origin_x.max(0);
        let y0 = origin_y.max(0);
        let x1 = (origin_x + i64::from(bitmap.width())).min(dst_w);
        let y1 = (origin_y + i64::from(bitmap.height())).min(dst_h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let src = bitmap.rgba_bytes();
        let src_w = i64::from(bitmap.width());
        for y in y0..y1 {
            for x in x0..x1 {
                let src_idx = offset(x - origin_x, y - origin_y, src_w);
                let dst_idx = offset(x, y, dst_w);
                blend_over(
                    &mut self.pixels[dst_idx..dst_idx + BYTES_PER_PIXEL],
                    &src[src_idx..src_idx + BYTES_PER_PIXEL],
                    opacity,
                );
            }
        }
    }

    fn into_bitmap(self) -> Bitmap {
        Bitmap::from_rgba(self.width, self.height, self.pixels)
    }
}

/// Byte offset of pixel `(x, y)`; callers guarantee non-negative in-bounds
/// coordinates.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn offset(x: i64, y: i64, width: i64) -> usize {
    ((y * width + x) as usize) * BYTES_PER_PIXEL
}

/// Source-over in straight (non-premultiplied) alpha.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_over(dst: &mut [u8], src: &[u8], opacity: f32) {
    let src_a = f32::from(src[3]) / 255.0 * opacity;
    if src_a <= 0.0 {
        return;
    }
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    for channel in 0..3 {
        let s = f32::from(src[channel]);
        let d = f32::from(dst[channel]);
        let value = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        dst[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

// SPDX-License-Identifier: MPL-2.0
//! [`BitmapCodec`] backed by the `image` crate.

use crate::application::port::{BitmapCodec, CodecError, ImageFormat};
use crate::domain::Bitmap;
use image_rs::{imageops::FilterType, DynamicImage, ImageBuffer, ImageError, Rgba, RgbaImage};
use std::io::Cursor;

/// Decodes PNG, JPEG, WebP, GIF, BMP, TIFF and ICO; encodes PNG, JPEG and WebP.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRsCodec;

impl ImageRsCodec {
    fn to_image(bitmap: &Bitmap) -> Result<RgbaImage, CodecError> {
        ImageBuffer::<Rgba<u8>, _>::from_raw(
            bitmap.width(),
            bitmap.height(),
            bitmap.rgba_bytes().to_vec(),
        )
        .ok_or(CodecError::InvalidDimensions {
            width: bitmap.width(),
            height: bitmap.height(),
        })
    }

    fn to_bitmap(image: RgbaImage) -> Bitmap {
        let (width, height) = image.dimensions();
        Bitmap::from_rgba(width, height, image.into_raw())
    }

    fn image_format(format: ImageFormat) -> image_rs::ImageFormat {
        match format {
            ImageFormat::Png => image_rs::ImageFormat::Png,
            ImageFormat::Jpeg => image_rs::ImageFormat::Jpeg,
            ImageFormat::WebP => image_rs::ImageFormat::WebP,
        }
    }
}

impl BitmapCodec for ImageRsCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, CodecError> {
        let image = image_rs::load_from_memory(bytes).map_err(|err| match err {
            ImageError::Unsupported(_) => CodecError::UnsupportedFormat,
            other => CodecError::Decode(other.to_string()),
        })?;
        Ok(Self::to_bitmap(image.to_rgba8()))
    }

    fn encode(&self, bitmap: &Bitmap, format: ImageFormat) -> Result<Vec<u8>, CodecError> {
        let image = Self::to_image(bitmap)?;
        let mut out = Cursor::new(Vec::new());

        // JPEG has no alpha channel
        let result = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgba8(image)
                .to_rgb8()
                .write_to(&mut out, Self::image_format(format))
        } else {
            image.write_to(&mut out, Self::image_format(format))
        };
        result.map_err(|err| CodecError::Encode(err.to_string()))?;
        Ok(out.into_inner())
    }

    fn resize(&self, bitmap: &Bitmap, width: u32, height: u32) -> Result<Bitmap, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidDimensions { width, height });
        }
        if bitmap.dimensions() == (width, height) {
            return Ok(bitmap.clone());
        }
        let image = Self::to_image(bitmap)?;
        let resized = image_rs::imageops::resize(&image, width, height, FilterType::Lanczos3);
        Ok(Self::to_bitmap(resized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Bitmap {
        let mut bytes = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let on = (x + y) % 2 == 0;
                bytes.extend_from_slice(if on { &[255, 255, 255, 255] } else { &[0, 0, 0, 128] });
            }
        }
        Bitmap::from_rgba(width, height, bytes)
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let codec = ImageRsCodec;
        let original = checker(7, 5);
        let bytes = codec.encode(&original, ImageFormat::Png).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(codec.decode(&bytes).unwrap(), original);
    }

    #[test]
    fn jpeg_output_drops_alpha_but_keeps_size() {
        let codec = ImageRsCodec;
        let bytes = codec.encode(&checker(16, 8), ImageFormat::Jpeg).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.pixel(0, 0).map(|p| p[3]), Some(255));
    }

    #[test]
    fn garbage_is_not_decodable() {
        let err = ImageRsCodec.decode(b"definitely not an image").unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedFormat | CodecError::Decode(_)
        ));
    }

    #[test]
    fn resize_hits_exact_dimensions() {
        let resized = ImageRsCodec.resize(&checker(10, 10), 25, 4).unwrap();
        assert_eq!(resized.dimensions(), (25, 4));
        assert!(ImageRsCodec.resize(&checker(2, 2), 0, 4).is_err());
    }

    #[test]
    fn thumbnail_caps_longest_edge() {
        let thumb = ImageRsCodec.thumbnail(&checker(400, 200), 80).unwrap();
        assert_eq!(thumb.dimensions(), (80, 40));

        let small = checker(20, 10);
        assert_eq!(ImageRsCodec.thumbnail(&small, 80).unwrap(), small);
    }
}

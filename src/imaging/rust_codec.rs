//! Pure Rust codec built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → PNG, TIFF, WebP | `image::DynamicImage::write_to` (lossless) |
//!
//! AVIF can be written but not read: the `image` crate's `"avif"` feature only
//! enables the encoder, so AVIF originals fail at decode.

use super::codec::{CodecError, Dimensions, ImageCodec};
use super::params::{OutputFormat, Quality};
use crate::geometry::PixelRect;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Pure Rust codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Drop to the pixel layout the target encoder accepts.
fn encodable(image: &DynamicImage, format: ImageFormat) -> DynamicImage {
    let opaque_only = matches!(format, ImageFormat::Jpeg);
    if image.color().has_alpha() && !opaque_only {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

impl ImageCodec for RustCodec {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, CodecError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| CodecError::Unrecognized(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        image::load_from_memory(bytes)
            .map_err(|e| CodecError::Unrecognized(format!("Failed to decode: {}", e)))
    }

    fn crop(&self, image: DynamicImage, rect: PixelRect) -> Result<DynamicImage, CodecError> {
        let fits_x = rect.x.checked_add(rect.width).is_some_and(|r| r <= image.width());
        let fits_y = rect.y.checked_add(rect.height).is_some_and(|b| b <= image.height());
        if !fits_x || !fits_y || rect.width == 0 || rect.height == 0 {
            return Err(CodecError::ProcessingFailed(format!(
                "Crop {:?} does not fit a {}x{} image",
                rect,
                image.width(),
                image.height()
            )));
        }
        Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
    }

    fn resize(
        &self,
        image: DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::ProcessingFailed(format!(
                "Cannot resize to {}x{}",
                width, height
            )));
        }
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        let format = format.format();
        let pixels = encodable(image, format);
        let mut bytes = Vec::new();
        let result = match format {
            ImageFormat::Jpeg => {
                let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                    &mut bytes,
                    quality.value() as u8,
                );
                pixels.write_with_encoder(encoder)
            }
            ImageFormat::Avif => {
                let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
                    &mut bytes,
                    6,
                    quality.value() as u8,
                );
                pixels.write_with_encoder(encoder)
            }
            ImageFormat::Png | ImageFormat::Tiff | ImageFormat::WebP => {
                pixels.write_to(&mut Cursor::new(&mut bytes), format)
            }
            other => {
                return Err(CodecError::UnsupportedFormat(format!("{:?}", other)));
            }
        };
        result.map_err(|e| {
            CodecError::ProcessingFailed(format!("{:?} encode failed: {}", format, e))
        })?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_rgba_bytes};

    fn jpeg() -> OutputFormat {
        OutputFormat(ImageFormat::Jpeg)
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let dims = RustCodec::new().identify(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn identify_garbage_is_unrecognized() {
        let result = RustCodec::new().identify(b"definitely not an image");
        assert!(result.is_err());
    }

    #[test]
    fn decode_garbage_is_unrecognized() {
        let result = RustCodec::new().decode(b"hello");
        assert!(matches!(result, Err(CodecError::Unrecognized(_))));
    }

    #[test]
    fn crop_then_resize_dimensions() {
        let codec = RustCodec::new();
        let img = codec.decode(&jpeg_bytes(64, 48)).unwrap();
        let rect = PixelRect {
            x: 8,
            y: 4,
            width: 32,
            height: 16,
        };
        let cropped = codec.crop(img, rect).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (32, 16));
        let resized = codec.resize(cropped, 10, 20).unwrap();
        assert_eq!((resized.width(), resized.height()), (10, 20));
    }

    #[test]
    fn crop_outside_image_errors() {
        let codec = RustCodec::new();
        let img = codec.decode(&jpeg_bytes(10, 10)).unwrap();
        let rect = PixelRect {
            x: 5,
            y: 0,
            width: 6,
            height: 10,
        };
        assert!(codec.crop(img, rect).is_err());
    }

    #[test]
    fn resize_to_zero_errors() {
        let codec = RustCodec::new();
        let img = codec.decode(&jpeg_bytes(10, 10)).unwrap();
        assert!(codec.resize(img, 0, 5).is_err());
    }

    #[test]
    fn encode_jpeg_roundtrips_dimensions() {
        let codec = RustCodec::new();
        let img = codec.decode(&jpeg_bytes(40, 30)).unwrap();
        let bytes = codec.encode(&img, jpeg(), Quality::new(80)).unwrap();
        let dims = codec.identify(&bytes).unwrap();
        assert_eq!((dims.width, dims.height), (40, 30));
    }

    #[test]
    fn encode_is_deterministic() {
        let codec = RustCodec::new();
        let img = codec.decode(&jpeg_bytes(40, 30)).unwrap();
        let a = codec.encode(&img, jpeg(), Quality::default()).unwrap();
        let b = codec.encode(&img, jpeg(), Quality::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn encode_png_keeps_alpha() {
        let codec = RustCodec::new();
        let img = codec.decode(&png_rgba_bytes(12, 12)).unwrap();
        let bytes = codec
            .encode(&img, OutputFormat(ImageFormat::Png), Quality::default())
            .unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn encode_rgba_to_jpeg_drops_alpha() {
        let codec = RustCodec::new();
        let img = codec.decode(&png_rgba_bytes(12, 12)).unwrap();
        assert!(codec.encode(&img, jpeg(), Quality::default()).is_ok());
    }

    #[test]
    fn encode_unsupported_format_errors() {
        let codec = RustCodec::new();
        let img = codec.decode(&jpeg_bytes(4, 4)).unwrap();
        let result = codec.encode(&img, OutputFormat(ImageFormat::Bmp), Quality::default());
        assert!(matches!(result, Err(CodecError::UnsupportedFormat(_))));
    }
}

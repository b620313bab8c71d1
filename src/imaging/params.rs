//! Parameter types for pixel operations.
//!
//! These describe *what* the codec should produce, not *how*. They sit between
//! the engine (which decides what a variant looks like) and the
//! [`codec`](super::codec) (which does the pixel work), so a mock codec can be
//! swapped in for tests without touching generation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`OutputFormat`]: Encoded format of a variant, always the original's format.
//! - [`RenderParams`]: Crop rectangle in pixels plus target dimensions.

use crate::geometry::PixelRect;
use image::ImageFormat;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Output format of an encoded variant.
///
/// Variants are never format-converted: the format follows the original's
/// file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat(pub ImageFormat);

impl OutputFormat {
    /// Resolve from an extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() {
            return None;
        }
        ImageFormat::from_extension(ext).map(Self)
    }

    pub fn format(self) -> ImageFormat {
        self.0
    }

    pub fn mime_type(self) -> &'static str {
        self.0.to_mime_type()
    }
}

/// Everything the codec needs to render one variant from decoded pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams {
    pub crop: PixelRect,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn output_format_from_extension() {
        assert_eq!(
            OutputFormat::from_extension(".jpg"),
            Some(OutputFormat(ImageFormat::Jpeg))
        );
        assert_eq!(
            OutputFormat::from_extension("PNG"),
            Some(OutputFormat(ImageFormat::Png))
        );
        assert_eq!(OutputFormat::from_extension(""), None);
        assert_eq!(OutputFormat::from_extension(".txt"), None);
    }

    #[test]
    fn output_format_mime_type() {
        assert_eq!(
            OutputFormat::from_extension("jpeg").unwrap().mime_type(),
            "image/jpeg"
        );
        assert_eq!(
            OutputFormat::from_extension("webp").unwrap().mime_type(),
            "image/webp"
        );
    }
}

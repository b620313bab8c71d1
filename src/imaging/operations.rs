//! High-level pixel operations.
//!
//! These combine geometry with codec execution: plan the pixel parameters,
//! then run decode → crop → resize → encode through any [`ImageCodec`].

use super::codec::{CodecError, Dimensions, ImageCodec};
use super::params::{OutputFormat, Quality, RenderParams};
use crate::geometry::{self, CropRect};

/// Result type for pixel operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Plan a variant render without executing it.
///
/// Converts the percent crop onto the original's pixel grid.
pub fn plan_render(
    original: Dimensions,
    crop: CropRect,
    width: u32,
    height: u32,
    format: OutputFormat,
    quality: Quality,
) -> RenderParams {
    RenderParams {
        crop: geometry::crop_to_pixels(crop, original.width, original.height),
        width,
        height,
        format,
        quality,
    }
}

/// Render one variant from the original's encoded bytes.
///
/// The crop is skipped when it covers the whole image and the resize is
/// skipped when the cropped region already has the target dimensions.
pub fn render_variant(
    codec: &impl ImageCodec,
    original: &[u8],
    params: &RenderParams,
) -> Result<Vec<u8>> {
    let decoded = codec.decode(original)?;

    let rect = params.crop;
    let covers_all = rect.x == 0
        && rect.y == 0
        && rect.width == decoded.width()
        && rect.height == decoded.height();
    let cropped = if covers_all {
        decoded
    } else {
        codec.crop(decoded, rect)?
    };

    let sized = if cropped.width() != params.width || cropped.height() != params.height {
        codec.resize(cropped, params.width, params.height)?
    } else {
        cropped
    };

    codec.encode(&sized, params.format, params.quality)
}

/// Shrink an encoded image to fit inside `max`, preserving aspect ratio.
///
/// Returns the re-encoded bytes and their dimensions.
pub fn downsize_to_fit(
    codec: &impl ImageCodec,
    bytes: &[u8],
    max: Dimensions,
    format: OutputFormat,
    quality: Quality,
) -> Result<(Vec<u8>, Dimensions)> {
    let decoded = codec.decode(bytes)?;
    let fitted = geometry::fit(
        geometry::aspect(decoded.width(), decoded.height()),
        max.width,
        max.height,
    )
    .map_err(|e| CodecError::ProcessingFailed(e.to_string()))?;
    let resized = codec.resize(decoded, fitted.width, fitted.height)?;
    let encoded = codec.encode(&resized, format, quality)?;
    Ok((
        encoded,
        Dimensions {
            width: fitted.width,
            height: fitted.height,
        },
    ))
}

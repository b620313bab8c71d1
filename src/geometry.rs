//! Pure geometry for variant derivation.
//!
//! Converts a resize intent (fit, fill, fill-at-anchor, explicit reframe) into
//! target pixel dimensions plus a [`CropRect`] expressed in percent of the
//! original. Nothing here touches storage or pixels, so every function is unit
//! testable with plain numbers.
//!
//! ## Rounding
//!
//! Fractions become integer percents with round-half-down
//! (`ceil(fraction * 100 - 0.5)`), so a centred fill of a 4:3 original into a
//! square lands on `12..87` rather than `13..88`. Both crop edges move the
//! same way, which keeps the span intact. Pixel dimensions use ordinary
//! `round()` and never drop below one pixel.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Fraction {0} does not map to a percent within 0-100")]
    PercentOutOfRange(f64),
    #[error("Anchor {axis}={value} must be within 0.0-1.0")]
    AnchorOutOfRange { axis: char, value: f64 },
    #[error("Target dimensions must be positive, got {width}x{height}")]
    ZeroTarget { width: u32, height: u32 },
    #[error(transparent)]
    InvalidCrop(#[from] InvalidCropError),
}

/// A crop rectangle that violates the percent bounds or edge ordering.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error(
    "Crop coordinates {x1}, {x2}, {y1}, {y2} are invalid: each must be 0-100 with x1 <= x2 and y1 <= y2"
)]
pub struct InvalidCropError {
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
}

/// Percent-space crop window within an original.
///
/// Each edge is an integer percent in `0..=100`, with `x1 <= x2` and
/// `y1 <= y2`. Because the bounds are percents, any valid rect maps inside the
/// original's pixel box regardless of its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CropRect {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
}

impl CropRect {
    /// The whole image.
    pub const FULL: CropRect = CropRect {
        x1: 0,
        y1: 0,
        x2: 100,
        y2: 100,
    };

    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self, InvalidCropError> {
        let in_bounds = [x1, y1, x2, y2].iter().all(|&edge| edge <= 100);
        if !in_bounds || x1 > x2 || y1 > y2 {
            return Err(InvalidCropError { x1, x2, y1, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Build from fractional edges (`0.0..=1.0`), rounding each to a percent.
    pub fn from_fractions(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, GeometryError> {
        Ok(Self::new(
            fraction_to_percent(x1)?,
            fraction_to_percent(y1)?,
            fraction_to_percent(x2)?,
            fraction_to_percent(y2)?,
        )?)
    }

    pub fn x1(&self) -> u32 {
        self.x1
    }

    pub fn y1(&self) -> u32 {
        self.y1
    }

    pub fn x2(&self) -> u32 {
        self.x2
    }

    pub fn y2(&self) -> u32 {
        self.y2
    }

    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }
}

/// Target dimensions plus crop window: the full geometric identity of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantGeometry {
    pub width: u32,
    pub height: u32,
    pub crop: CropRect,
}

/// Pixel-space rectangle handed to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Width over height.
pub fn aspect(width: u32, height: u32) -> f64 {
    width as f64 / height as f64
}

/// Convert a fraction to an integer percent (round-half-down), rejecting
/// anything that lands outside `0..=100`.
pub fn fraction_to_percent(fraction: f64) -> Result<u32, GeometryError> {
    let percent = (fraction * 100.0 - 0.5).ceil();
    if !(0.0..=100.0).contains(&percent) {
        return Err(GeometryError::PercentOutOfRange(fraction));
    }
    Ok(percent as u32)
}

fn check_target(width: u32, height: u32) -> Result<(), GeometryError> {
    if width == 0 || height == 0 {
        return Err(GeometryError::ZeroTarget { width, height });
    }
    Ok(())
}

fn check_anchor(axis: char, value: f64) -> Result<(), GeometryError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(GeometryError::AnchorOutOfRange { axis, value });
    }
    Ok(())
}

/// Stretch the whole original to exactly `target_width x target_height`.
pub fn exact(target_width: u32, target_height: u32) -> Result<VariantGeometry, GeometryError> {
    check_target(target_width, target_height)?;
    Ok(VariantGeometry {
        width: target_width,
        height: target_height,
        crop: CropRect::FULL,
    })
}

/// Fit inside the target box, preserving aspect ratio. No crop.
///
/// The result may be smaller than the target on one axis.
///
/// ```
/// # use managed_image::geometry::{fit, aspect};
/// let g = fit(aspect(640, 480), 100, 100).unwrap();
/// assert_eq!((g.width, g.height), (100, 75));
/// ```
pub fn fit(
    original_aspect: f64,
    target_width: u32,
    target_height: u32,
) -> Result<VariantGeometry, GeometryError> {
    check_target(target_width, target_height)?;
    let target_aspect = aspect(target_width, target_height);

    let (width, height) = if original_aspect > target_aspect {
        // Wider than the box: width-bound
        let h = (target_width as f64 / original_aspect).round() as u32;
        (target_width, h.max(1))
    } else {
        let w = (target_height as f64 * original_aspect).round() as u32;
        (w.max(1), target_height)
    };

    Ok(VariantGeometry {
        width,
        height,
        crop: CropRect::FULL,
    })
}

/// Fill the target box exactly, cropping the longer axis around the centre.
pub fn fill(
    original_aspect: f64,
    target_width: u32,
    target_height: u32,
) -> Result<VariantGeometry, GeometryError> {
    fill_at(original_aspect, target_width, target_height, 0.5, 0.5)
}

/// Fill the target box exactly, biasing the crop window toward an anchor.
///
/// `anchor_x`/`anchor_y` are fractions of the original (`0.5` = centred). The
/// window slides toward the anchor but never past the image edge.
pub fn fill_at(
    original_aspect: f64,
    target_width: u32,
    target_height: u32,
    anchor_x: f64,
    anchor_y: f64,
) -> Result<VariantGeometry, GeometryError> {
    check_target(target_width, target_height)?;
    check_anchor('x', anchor_x)?;
    check_anchor('y', anchor_y)?;
    let target_aspect = aspect(target_width, target_height);

    let crop = if original_aspect > target_aspect {
        // Full height, partial width
        let (x1, x2) = crop_window(target_aspect / original_aspect, anchor_x);
        CropRect::from_fractions(x1, 0.0, x2, 1.0)?
    } else {
        // Full width, partial height
        let (y1, y2) = crop_window(original_aspect / target_aspect, anchor_y);
        CropRect::from_fractions(0.0, y1, 1.0, y2)?
    };

    Ok(VariantGeometry {
        width: target_width,
        height: target_height,
        crop,
    })
}

/// Start/end fractions of a window covering `kept` of an axis, shifted toward `anchor`.
fn crop_window(kept: f64, anchor: f64) -> (f64, f64) {
    let total_padding = (1.0 - kept).max(0.0);
    let max_offset = total_padding / 2.0;
    let offset = (anchor - 0.5).clamp(-max_offset, max_offset);
    (
        total_padding / 2.0 + offset,
        1.0 - total_padding / 2.0 + offset,
    )
}

/// Explicit crop window given as fractions, scaled to the target dimensions.
///
/// The caller owns aspect ratio here; the result is exactly what was asked for.
pub fn reframe(
    target_width: u32,
    target_height: u32,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
) -> Result<VariantGeometry, GeometryError> {
    check_target(target_width, target_height)?;
    Ok(VariantGeometry {
        width: target_width,
        height: target_height,
        crop: CropRect::from_fractions(x1, y1, x2, y2)?,
    })
}

/// Map a percent-space crop onto an original's pixel grid.
///
/// Edges are rounded independently and the span is their difference, so two
/// adjacent crops never drift apart by a pixel. A zero-width span is widened
/// to one pixel, kept inside the image.
pub fn crop_to_pixels(crop: CropRect, width: u32, height: u32) -> PixelRect {
    let (x, w) = span_to_pixels(crop.x1, crop.x2, width);
    let (y, h) = span_to_pixels(crop.y1, crop.y2, height);
    PixelRect {
        x,
        y,
        width: w,
        height: h,
    }
}

fn span_to_pixels(start: u32, end: u32, extent: u32) -> (u32, u32) {
    let edge = |percent: u32| {
        let px = (percent as f64 / 100.0 * extent as f64).round() as u32;
        px.min(extent)
    };
    let (lo, hi) = (edge(start), edge(end));
    if hi > lo {
        (lo, hi - lo)
    } else {
        (lo.min(extent.saturating_sub(1)), 1)
    }
}

//! Request handlers for the resize and show endpoints.
//!
//! Each handler is a plain function that takes its dependency, a
//! [`VariantService`], as an argument plus a deserialized parameter struct.
//! An HTTP layer only has to parse the query string into the params type and
//! turn the result into a response; [`status_code`] maps errors onto HTTP
//! status codes.
//!
//! Resize handlers answer with a [`VariantDescriptor`], never with pixels.
//! Nothing is rendered until the descriptor's URL is requested through
//! [`show`]. Because those URLs carry a valid digest, resize endpoints should
//! sit behind access control.
//!
//! ## Sanitization
//!
//! | Param | Rule |
//! |---|---|
//! | `width`, `height` | clamped to `1..=limits.max_variant_size` |
//! | `x1`, `x2`, `y1`, `y2` | integer percents clamped to `0..=100` |
//! | `x`, `y` (fill anchor) | percents clamped to `0..=100`, divided by 100 |

use crate::engine::{Delivery, EngineError, VariantEngine};
use crate::imaging::ImageCodec;
use crate::original::Original;
use crate::storage::{Storage, StorageError};
use crate::variant::{Variant, VariantDescriptor};
use serde::{Deserialize, Serialize};

/// The slice of the engine the handlers need.
pub trait VariantService {
    fn original(&self, path: &str) -> Result<Original, EngineError>;
    fn describe(&self, variant: &Variant) -> VariantDescriptor;
    fn deliver(&self, path: &str, digest: &str) -> Result<Delivery, EngineError>;
    /// Largest variant a request may ask for, as `[width, height]`.
    fn max_variant_size(&self) -> [u32; 2];
}

impl<S: Storage, C: ImageCodec> VariantService for VariantEngine<S, C> {
    fn original(&self, path: &str) -> Result<Original, EngineError> {
        VariantEngine::original(self, path)
    }

    fn describe(&self, variant: &Variant) -> VariantDescriptor {
        VariantEngine::describe(self, variant)
    }

    fn deliver(&self, path: &str, digest: &str) -> Result<Delivery, EngineError> {
        VariantEngine::deliver(self, path, digest)
    }

    fn max_variant_size(&self) -> [u32; 2] {
        self.limits().max_variant_size
    }
}

/// `image`, `width`, `height`. Missing numbers read as 0 and clamp up to 1.
#[derive(Debug, Clone, Deserialize)]
pub struct SizeParams {
    pub image: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
}

/// [`SizeParams`] plus an anchor in percent (default centre).
#[derive(Debug, Clone, Deserialize)]
pub struct FillAtParams {
    pub image: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default = "centre")]
    pub x: f64,
    #[serde(default = "centre")]
    pub y: f64,
}

fn centre() -> f64 {
    50.0
}

/// [`SizeParams`] plus a crop window in integer percent (default full image).
#[derive(Debug, Clone, Deserialize)]
pub struct ReframeParams {
    pub image: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub x1: i64,
    #[serde(default = "full")]
    pub x2: i64,
    #[serde(default)]
    pub y1: i64,
    #[serde(default = "full")]
    pub y2: i64,
}

fn full() -> i64 {
    100
}

/// A variant path plus its `q` digest.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowParams {
    pub path: String,
    #[serde(default)]
    pub q: String,
}

/// JSON body for a failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&EngineError> for ErrorResponse {
    fn from(e: &EngineError) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}

fn clamp_dimension(value: i64, max: u32) -> u32 {
    value.clamp(1, i64::from(max.max(1))) as u32
}

fn clamp_percent(value: i64) -> u32 {
    value.clamp(0, 100) as u32
}

fn anchor(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.5;
    }
    percent.clamp(0.0, 100.0) / 100.0
}

fn target(service: &impl VariantService, width: i64, height: i64) -> (u32, u32) {
    let [max_w, max_h] = service.max_variant_size();
    (clamp_dimension(width, max_w), clamp_dimension(height, max_h))
}

/// Stretch to exact dimensions.
pub fn resize(
    service: &impl VariantService,
    params: &SizeParams,
) -> Result<VariantDescriptor, EngineError> {
    let original = service.original(&params.image)?;
    let (w, h) = target(service, params.width, params.height);
    Ok(service.describe(&original.resize(w, h)?))
}

/// Fit inside the box, preserving aspect ratio.
pub fn resize_to_fit(
    service: &impl VariantService,
    params: &SizeParams,
) -> Result<VariantDescriptor, EngineError> {
    let original = service.original(&params.image)?;
    let (w, h) = target(service, params.width, params.height);
    Ok(service.describe(&original.resize_to_fit(w, h)?))
}

/// Fill the box, cropping the centre.
pub fn resize_to_fill(
    service: &impl VariantService,
    params: &SizeParams,
) -> Result<VariantDescriptor, EngineError> {
    let original = service.original(&params.image)?;
    let (w, h) = target(service, params.width, params.height);
    Ok(service.describe(&original.resize_to_fill(w, h)?))
}

/// Fill the box, cropping around the anchor.
pub fn resize_to_fill_at(
    service: &impl VariantService,
    params: &FillAtParams,
) -> Result<VariantDescriptor, EngineError> {
    let original = service.original(&params.image)?;
    let (w, h) = target(service, params.width, params.height);
    let variant = original.resize_to_fill_at(w, h, anchor(params.x), anchor(params.y))?;
    Ok(service.describe(&variant))
}

/// Exact dimensions from an explicit crop window. The client owns aspect ratio.
pub fn reframe(
    service: &impl VariantService,
    params: &ReframeParams,
) -> Result<VariantDescriptor, EngineError> {
    let original = service.original(&params.image)?;
    let (w, h) = target(service, params.width, params.height);
    let fraction = |p: i64| f64::from(clamp_percent(p)) / 100.0;
    let variant = original.reframe(
        w,
        h,
        fraction(params.x1),
        fraction(params.y1),
        fraction(params.x2),
        fraction(params.y2),
    )?;
    Ok(service.describe(&variant))
}

/// Serve variant bytes, generating them if the digest allows.
pub fn show(service: &impl VariantService, params: &ShowParams) -> Result<Delivery, EngineError> {
    service.deliver(&params.path, &params.q)
}

/// HTTP status for a failed request.
pub fn status_code(error: &EngineError) -> u16 {
    match error {
        EngineError::Authentication { .. } => 403,
        EngineError::Variant(_) | EngineError::Path(_) | EngineError::UnsupportedFormat(_) => 400,
        EngineError::Storage(StorageError::NotFound(_)) => 404,
        EngineError::Storage(StorageError::InvalidPath(_)) => 400,
        EngineError::Storage(_) | EngineError::Codec(_) => 500,
    }
}

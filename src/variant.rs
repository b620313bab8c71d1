//! Variant identity.
//!
//! A [`Variant`] is an [`Original`] plus target dimensions plus a
//! [`CropRect`]. It is a plain value: building one does no I/O, and two
//! variants built from the same inputs have the same canonical path.
//!
//! The `authenticated` flag records where the value came from:
//!
//! | Origin | `authenticated` |
//! |---|---|
//! | [`Original`] resize methods (server-side code) | always `true` |
//! | [`Variant::from_path`] with the matching digest | `true` |
//! | [`Variant::from_path`] with any other digest | `false` |
//!
//! Only the engine reads the flag, and only to decide whether a missing
//! variant may be rendered.

use crate::digest::{AuthDigest, DigestKey};
use crate::geometry::{CropRect, GeometryError, InvalidCropError};
use crate::naming::{self, PathError};
use crate::original::Original;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariantError {
    #[error(transparent)]
    InvalidCrop(#[from] InvalidCropError),
    #[error("Variant dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Geometry error: {0}")]
    Geometry(GeometryError),
    #[error(transparent)]
    Path(#[from] PathError),
}

impl From<GeometryError> for VariantError {
    fn from(e: GeometryError) -> Self {
        match e {
            GeometryError::InvalidCrop(crop) => VariantError::InvalidCrop(crop),
            GeometryError::ZeroTarget { width, height } => {
                VariantError::InvalidDimensions { width, height }
            }
            other => VariantError::Geometry(other),
        }
    }
}

/// A derived crop/resize of an original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    original: Original,
    width: u32,
    height: u32,
    crop: CropRect,
    authenticated: bool,
}

impl Variant {
    pub(crate) fn new(
        original: Original,
        width: u32,
        height: u32,
        crop: CropRect,
        authenticated: bool,
    ) -> Result<Self, VariantError> {
        if width == 0 || height == 0 {
            return Err(VariantError::InvalidDimensions { width, height });
        }
        Ok(Self {
            original,
            width,
            height,
            crop,
            authenticated,
        })
    }

    /// Rebuild a variant from its canonical path and a client-supplied digest.
    ///
    /// Malformed paths and out-of-range crops are errors. A wrong digest is
    /// not: the variant is returned unauthenticated, which still allows
    /// serving bytes that already exist.
    pub fn from_path(path: &str, digest: &str, key: &DigestKey) -> Result<Self, VariantError> {
        let parsed = naming::parse_variant_path(path)?;
        let original = Original::new(
            parsed.original.path(),
            parsed.original.width,
            parsed.original.height,
        )?;
        let crop = CropRect::new(parsed.x1, parsed.y1, parsed.x2, parsed.y2)?;
        let mut variant = Self::new(original, parsed.width, parsed.height, crop, false)?;
        variant.authenticated = key.verify(&variant.path(), digest);
        Ok(variant)
    }

    pub fn original(&self) -> &Original {
        &self.original
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn crop(&self) -> CropRect {
        self.crop
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Canonical path: the cache key and the delivery path.
    pub fn path(&self) -> String {
        naming::variant_path(self.original.path(), self.width, self.height, self.crop)
    }

    pub fn digest(&self, key: &DigestKey) -> AuthDigest {
        key.digest_for(&self.path())
    }

    /// `{path}?q={digest}`
    pub fn path_with_query(&self, key: &DigestKey) -> String {
        format!("{}?q={}", self.path(), self.digest(key))
    }

    pub fn mime_type(&self) -> Option<&'static str> {
        self.original.mime_type()
    }

    /// JSON view of the variant. `url` comes from the variant storage.
    pub fn descriptor(&self, key: &DigestKey, url: String) -> VariantDescriptor {
        VariantDescriptor {
            image: self.original.clone(),
            url,
            path: self.path(),
            path_with_query: self.path_with_query(key),
            width: self.width,
            height: self.height,
            x1: self.crop.x1(),
            x2: self.crop.x2(),
            y1: self.crop.y1(),
            y2: self.crop.y2(),
        }
    }
}

/// What a resize request answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDescriptor {
    pub image: Original,
    pub url: String,
    pub path: String,
    pub path_with_query: String,
    pub width: u32,
    pub height: u32,
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
}

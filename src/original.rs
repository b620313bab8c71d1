//! Stored originals and the resize intents that derive variants from them.
//!
//! An [`Original`] is `(path, width, height)`. The path already encodes the
//! content hash and the stored dimensions, so [`Original::from_path`] recovers
//! the whole identity from a string without consulting any metadata store.

use crate::geometry::{self, CropRect};
use crate::imaging::OutputFormat;
use crate::naming::{self, PathError};
use crate::variant::{Variant, VariantError};
use serde::Serialize;

/// An uploaded image as stored, possibly downsized at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Original {
    path: String,
    width: u32,
    height: u32,
}

impl Original {
    /// An original whose canonical path must encode `width` x `height`.
    pub(crate) fn new(
        path: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Result<Self, VariantError> {
        if width == 0 || height == 0 {
            return Err(VariantError::InvalidDimensions { width, height });
        }
        let path = path.into();
        let parsed = naming::parse_original_path(&path)?;
        if (parsed.width, parsed.height) != (width, height) {
            return Err(PathError {
                reason: format!(
                    "path encodes {}x{} but the original is {}x{}",
                    parsed.width, parsed.height, width, height
                ),
                path,
            }
            .into());
        }
        Ok(Self {
            path,
            width,
            height,
        })
    }

    /// Reconstruct an original from its canonical `{dir}/{hash}-{w}-{h}{ext}` path.
    pub fn from_path(path: &str) -> Result<Self, PathError> {
        let parsed = naming::parse_original_path(path)?;
        if parsed.width == 0 || parsed.height == 0 {
            return Err(PathError {
                path: path.to_string(),
                reason: "dimensions must be positive".into(),
            });
        }
        Ok(Self {
            path: path.to_string(),
            width: parsed.width,
            height: parsed.height,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f64 {
        geometry::aspect(self.width, self.height)
    }

    /// Path without the extension.
    pub fn basepath(&self) -> String {
        naming::base_path(&self.path)
    }

    /// Extension including its dot, or `""`.
    pub fn extname(&self) -> &str {
        naming::split_path(&self.path).2
    }

    /// Encoded format, which every variant of this original shares.
    pub fn output_format(&self) -> Option<OutputFormat> {
        OutputFormat::from_extension(self.extname())
    }

    pub fn mime_type(&self) -> Option<&'static str> {
        self.output_format().map(OutputFormat::mime_type)
    }

    /// Server-side variant constructor. The result is always authenticated.
    pub fn new_variant(
        &self,
        width: u32,
        height: u32,
        crop: CropRect,
    ) -> Result<Variant, VariantError> {
        Variant::new(self.clone(), width, height, crop, true)
    }

    /// Stretch to exactly `width x height`. Aspect ratio is not preserved.
    pub fn resize(&self, width: u32, height: u32) -> Result<Variant, VariantError> {
        self.derive(geometry::exact(width, height)?)
    }

    /// Fit inside `width x height`, preserving aspect ratio. May come out smaller.
    pub fn resize_to_fit(&self, width: u32, height: u32) -> Result<Variant, VariantError> {
        self.derive(geometry::fit(self.aspect(), width, height)?)
    }

    /// Exactly `width x height`, cropping the centre.
    pub fn resize_to_fill(&self, width: u32, height: u32) -> Result<Variant, VariantError> {
        self.derive(geometry::fill(self.aspect(), width, height)?)
    }

    /// Exactly `width x height`, cropping around an anchor (fractions, `0.5` = centre).
    pub fn resize_to_fill_at(
        &self,
        width: u32,
        height: u32,
        anchor_x: f64,
        anchor_y: f64,
    ) -> Result<Variant, VariantError> {
        self.derive(geometry::fill_at(
            self.aspect(),
            width,
            height,
            anchor_x,
            anchor_y,
        )?)
    }

    /// Explicit crop window in fractions, scaled to `width x height`.
    pub fn reframe(
        &self,
        width: u32,
        height: u32,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    ) -> Result<Variant, VariantError> {
        self.derive(geometry::reframe(width, height, x1, y1, x2, y2)?)
    }

    fn derive(&self, g: geometry::VariantGeometry) -> Result<Variant, VariantError> {
        self.new_variant(g.width, g.height, g.crop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landscape() -> Original {
        Original::from_path("site/abc/deadbeef-640-480.jpg").unwrap()
    }

    #[test]
    fn from_path_reads_dimensions() {
        let o = landscape();
        assert_eq!((o.width(), o.height()), (640, 480));
        assert_eq!(o.path(), "site/abc/deadbeef-640-480.jpg");
    }

    #[test]
    fn from_path_rejects_zero_dimension() {
        let err = Original::from_path("site/deadbeef-0-480.jpg").unwrap_err();
        assert!(err.reason.contains("positive"));
    }

    #[test]
    fn from_path_rejects_non_canonical_name() {
        assert!(Original::from_path("site/holiday.jpg").is_err());
    }

    #[test]
    fn new_rejects_zero_dimension() {
        assert!(matches!(
            Original::new("a.jpg", 0, 1),
            Err(VariantError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn new_accepts_matching_dimensions() {
        let o = Original::new("site/h-640-480.jpg", 640, 480).unwrap();
        assert_eq!(o, Original::from_path("site/h-640-480.jpg").unwrap());
    }

    #[test]
    fn new_rejects_dimensions_the_path_does_not_encode() {
        let err = Original::new("site/h-640-480.jpg", 320, 240).unwrap_err();
        assert!(matches!(err, VariantError::Path(ref e) if e.reason.contains("640x480")));
    }

    #[test]
    fn new_rejects_non_canonical_path() {
        assert!(matches!(
            Original::new("site/holiday.jpg", 640, 480),
            Err(VariantError::Path(_))
        ));
    }

    #[test]
    fn basepath_and_extname() {
        let o = landscape();
        assert_eq!(o.basepath(), "site/abc/deadbeef-640-480");
        assert_eq!(o.extname(), ".jpg");
        assert_eq!(o.mime_type(), Some("image/jpeg"));
    }

    #[test]
    fn unknown_extension_has_no_mime_type() {
        let o = Original::from_path("d/h-1-1.xyz").unwrap();
        assert_eq!(o.mime_type(), None);
    }

    #[test]
    fn resize_to_fit_width_bound() {
        let v = landscape().resize_to_fit(100, 100).unwrap();
        assert_eq!((v.width(), v.height()), (100, 75));
        assert!(v.crop().is_full());
        assert!(v.is_authenticated());
    }

    #[test]
    fn resize_to_fill_centred() {
        let v = landscape().resize_to_fill(100, 100).unwrap();
        assert_eq!((v.width(), v.height()), (100, 100));
        let c = v.crop();
        assert_eq!((c.x1(), c.x2(), c.y1(), c.y2()), (12, 87, 0, 100));
    }

    #[test]
    fn resize_to_fill_at_anchor() {
        let v = landscape().resize_to_fill_at(100, 100, 0.0, 0.5).unwrap();
        let c = v.crop();
        assert_eq!((c.x1(), c.x2()), (0, 75));
    }

    #[test]
    fn resize_exact_keeps_full_crop() {
        let v = landscape().resize(300, 50).unwrap();
        assert_eq!((v.width(), v.height()), (300, 50));
        assert!(v.crop().is_full());
    }

    #[test]
    fn reframe_uses_given_window() {
        let v = landscape().reframe(64, 48, 0.25, 0.5, 0.75, 1.0).unwrap();
        let c = v.crop();
        assert_eq!((c.x1(), c.y1(), c.x2(), c.y2()), (25, 50, 75, 100));
    }

    #[test]
    fn zero_target_is_invalid_dimensions() {
        assert!(matches!(
            landscape().resize_to_fit(0, 10),
            Err(VariantError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn anchor_out_of_range_is_geometry_error() {
        assert!(matches!(
            landscape().resize_to_fill_at(10, 10, 2.0, 0.5),
            Err(VariantError::Geometry(_))
        ));
    }

    #[test]
    fn reversed_reframe_is_invalid_crop() {
        assert!(matches!(
            landscape().reframe(10, 10, 0.8, 0.0, 0.2, 1.0),
            Err(VariantError::InvalidCrop(_))
        ));
    }

    #[test]
    fn serializes_identity_fields() {
        let json = serde_json::to_value(landscape()).unwrap();
        assert_eq!(json["path"], "site/abc/deadbeef-640-480.jpg");
        assert_eq!(json["height"], 480);
    }
}

//! Pixel work in pure Rust, with no system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Crop** | `DynamicImage::crop_imm` |
//! | **Resize** | Lanczos3 `resize_exact` |
//! | **Encode** | JPEG/AVIF at configured quality, PNG/TIFF/WebP lossless |
//!
//! The module is split into:
//! - **Parameters**: Data structures describing a render
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: High-level functions combining geometry + codec

pub mod codec;
pub mod operations;
mod params;
pub mod rust_codec;

pub use codec::{CodecError, Dimensions, ImageCodec};
pub use operations::{downsize_to_fit, plan_render, render_variant};
pub use params::{OutputFormat, Quality, RenderParams};
pub use rust_codec::RustCodec;

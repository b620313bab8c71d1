//! Shared test utilities.
//!
//! Synthetic images are generated in memory with the `image` crate, so no
//! fixture files are needed.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let engine = memory_engine(RecordingCodec::new());
//! let original = store_original(&engine, "site", 640, 480);
//! let variant = original.resize_to_fit(100, 100).unwrap();
//! engine.ensure_generated(&variant).unwrap();
//! ```

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

use crate::config::EngineConfig;
use crate::digest::hash_bytes;
use crate::engine::VariantEngine;
use crate::imaging::ImageCodec;
use crate::naming;
use crate::original::Original;
use crate::storage::{MemoryStorage, Storage};

// =========================================================================
// Synthetic images
// =========================================================================

/// A JPEG with a colour gradient, so crops of different regions differ.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

/// A PNG with a varying alpha channel.
pub fn png_rgba_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([200, (x * 255 / width.max(1)) as u8, 50, (y * 255 / height.max(1)) as u8])
    });
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

// =========================================================================
// Engines and originals
// =========================================================================

/// Engine over two in-memory storages with default config.
pub fn memory_engine<C: ImageCodec>(codec: C) -> VariantEngine<MemoryStorage, C> {
    VariantEngine::new(
        &EngineConfig::default(),
        MemoryStorage::new("http://originals.test"),
        MemoryStorage::new("http://variants.test"),
        codec,
    )
    .unwrap()
}

/// Put a synthetic JPEG original straight into the engine's original storage.
pub fn store_original<C: ImageCodec>(
    engine: &VariantEngine<MemoryStorage, C>,
    dir: &str,
    width: u32,
    height: u32,
) -> Original {
    let bytes = jpeg_bytes(width, height);
    let path = naming::original_path(dir, &hash_bytes(&bytes), width, height, ".jpg");
    engine.originals().create(&path, &bytes).unwrap();
    Original::new(path, width, height).unwrap()
}

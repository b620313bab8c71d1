//! Upload finalization: turning uploaded bytes into a stored [`Original`].
//!
//! Checks run cheapest first:
//!
//! 1. Directory segments are lowercase alphanumerics, `-` or `_`
//! 2. Byte size is within `limits.max_file_size`
//! 3. The extension names an encodable image format
//! 4. The header decodes to dimensions within `limits.max_upload_size`
//!
//! The stored name is `{dir}/{sha256}-{w}-{h}{ext}`. Uploads larger than
//! `limits.max_original_size` are downsized to fit (aspect preserved, same
//! format) and stored under their new dimensions. Because the name is derived
//! from the content, uploading the same bytes twice lands on the same path
//! and the second upload writes nothing.

use crate::digest::hash_bytes;
use crate::engine::VariantEngine;
use crate::imaging::{CodecError, Dimensions, ImageCodec, OutputFormat, downsize_to_fit};
use crate::naming;
use crate::original::Original;
use crate::storage::{Storage, StorageError};
use crate::variant::VariantError;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Uploaded file is {size} bytes; the limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Uploaded image is {width}x{height}; it must be at most {max_width}x{max_height}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("The uploaded file was not a recognized image: {0}")]
    InvalidImage(String),
    #[error("Invalid directory {dir:?}: each segment must match [0-9a-z_-]+")]
    InvalidDirectory { dir: String },
    #[error("Unsupported image extension {0:?}")]
    UnsupportedExtension(String),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Variant(#[from] VariantError),
}

/// Normalize and validate an upload directory.
///
/// Leading and trailing slashes are dropped; every remaining segment must be
/// non-empty and made of `[0-9a-z_-]`.
pub fn normalize_dir(dir: &str) -> Result<String, IngestError> {
    let trimmed = dir.trim_matches('/');
    let valid = !trimmed.is_empty()
        && trimmed.split('/').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase() || b == b'-' || b == b'_')
        });
    if !valid {
        return Err(IngestError::InvalidDirectory {
            dir: dir.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Lowercased extension of an uploaded filename, with its dot.
fn upload_extension(filename: &str) -> Result<(String, OutputFormat), IngestError> {
    let (_, _, ext) = naming::split_path(filename);
    let ext = ext.to_ascii_lowercase();
    let format = OutputFormat::from_extension(&ext)
        .ok_or_else(|| IngestError::UnsupportedExtension(ext.clone()))?;
    Ok((ext, format))
}

fn exceeds(dims: Dimensions, limit: [u32; 2]) -> bool {
    dims.width > limit[0] || dims.height > limit[1]
}

impl<S: Storage, C: ImageCodec> VariantEngine<S, C> {
    /// Store an uploaded image as an original.
    ///
    /// `filename` is the client's name for the file; only its extension is
    /// kept.
    pub fn ingest(&self, dir: &str, filename: &str, bytes: &[u8]) -> Result<Original, IngestError> {
        let dir = normalize_dir(dir)?;
        let limits = self.limits();

        let size = bytes.len() as u64;
        if size > limits.max_file_size {
            return Err(IngestError::FileTooLarge {
                size,
                limit: limits.max_file_size,
            });
        }

        let (ext, format) = upload_extension(filename)?;
        let src = self
            .codec()
            .identify(bytes)
            .map_err(|e| IngestError::InvalidImage(e.to_string()))?;
        if exceeds(src, limits.max_upload_size) {
            return Err(IngestError::ImageTooLarge {
                width: src.width,
                height: src.height,
                max_width: limits.max_upload_size[0],
                max_height: limits.max_upload_size[1],
            });
        }

        let hash = hash_bytes(bytes);
        let max_original = Dimensions {
            width: limits.max_original_size[0],
            height: limits.max_original_size[1],
        };

        let (stored, dims) = if exceeds(src, limits.max_original_size) {
            let (resized, dims) =
                downsize_to_fit(self.codec(), bytes, max_original, format, self.quality())?;
            (Some(resized), dims)
        } else {
            (None, src)
        };

        let path = naming::original_path(&dir, &hash, dims.width, dims.height, &ext);
        if self.originals().exists(&path)? {
            info!(path = %path, "original already stored");
        } else {
            let data = stored.as_deref().unwrap_or(bytes);
            self.originals().create(&path, data)?;
            info!(
                path = %path,
                width = dims.width,
                height = dims.height,
                downsized = stored.is_some(),
                "original stored"
            );
        }

        Ok(Original::new(path, dims.width, dims.height)?)
    }
}

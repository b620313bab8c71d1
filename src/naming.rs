//! Canonical path codec for originals and variants.
//!
//! Every stored file is named by what it is, so a path alone is enough to
//! reconstruct its identity without any metadata lookup:
//!
//! ```text
//! site/abc123/{hash}-{w}-{h}.jpg                          original
//! site/abc123/{hash}-{w}-{h}-{vw}-{vh}-{x1}-{x2}-{y1}-{y2}.jpg   variant
//! ```
//!
//! - `hash` is the SHA-256 of the uploaded bytes (hex, no dashes)
//! - `w`/`h` are the stored original's dimensions
//! - `vw`/`vh` are the variant's target dimensions
//! - `x1 x2 y1 y2` are the crop edges in percent, in that order
//!
//! The extension (with its dot) is carried through unchanged. Encoding is a
//! pure string join; parsing splits the file stem on `-` and reads fields by
//! position.

use crate::geometry::CropRect;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed image path {path:?}: {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: String,
}

impl PathError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Fields recovered from an original's filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOriginal {
    /// Containing directory, empty for a bare filename.
    pub dir: String,
    pub hash: String,
    pub width: u32,
    pub height: u32,
    /// Extension including the leading dot, empty if there is none.
    pub ext: String,
}

impl ParsedOriginal {
    /// Reassemble the original's canonical path.
    pub fn path(&self) -> String {
        original_path(&self.dir, &self.hash, self.width, self.height, &self.ext)
    }
}

/// Fields recovered from a variant's filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVariant {
    pub original: ParsedOriginal,
    pub width: u32,
    pub height: u32,
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
}

/// Split a path into `(dir, stem, ext)`, where `ext` keeps its dot.
///
/// A leading dot on the filename is part of the stem, not an extension.
pub fn split_path(path: &str) -> (&str, &str, &str) {
    let (dir, filename) = path.rsplit_once('/').unwrap_or(("", path));
    match filename.rfind('.') {
        Some(dot) if dot > 0 => (dir, &filename[..dot], &filename[dot..]),
        _ => (dir, filename, ""),
    }
}

/// Join a directory and filename with a single `/` (no leading `/` when `dir` is empty).
pub fn join(dir: &str, filename: &str) -> String {
    if dir.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), filename)
    }
}

/// Path of everything but the extension: `dir/stem`.
pub fn base_path(path: &str) -> String {
    let (dir, stem, _) = split_path(path);
    join(dir, stem)
}

/// Canonical path of a stored original.
pub fn original_path(dir: &str, hash: &str, width: u32, height: u32, ext: &str) -> String {
    join(dir, &format!("{}-{}-{}{}", hash, width, height, ext))
}

/// Canonical path of a variant, derived from its original's path.
pub fn variant_path(original_path: &str, width: u32, height: u32, crop: CropRect) -> String {
    let (_, _, ext) = split_path(original_path);
    format!(
        "{}-{}-{}-{}-{}-{}-{}{}",
        base_path(original_path),
        width,
        height,
        crop.x1(),
        crop.x2(),
        crop.y1(),
        crop.y2(),
        ext
    )
}

fn parse_field(path: &str, name: &str, raw: &str) -> Result<u32, PathError> {
    raw.parse::<u32>()
        .map_err(|_| PathError::new(path, format!("{name} field {raw:?} is not a number")))
}

fn parse_hash<'a>(path: &str, raw: &'a str) -> Result<&'a str, PathError> {
    if raw.is_empty() {
        return Err(PathError::new(path, "content hash is empty"));
    }
    Ok(raw)
}

/// Parse `{dir}/{hash}-{w}-{h}{ext}`.
pub fn parse_original_path(path: &str) -> Result<ParsedOriginal, PathError> {
    let (dir, stem, ext) = split_path(path);
    let slices: Vec<&str> = stem.split('-').collect();
    let [hash, width, height] = slices.as_slice() else {
        return Err(PathError::new(
            path,
            format!("expected 3 dash-separated fields, found {}", slices.len()),
        ));
    };
    Ok(ParsedOriginal {
        dir: dir.to_string(),
        hash: parse_hash(path, hash)?.to_string(),
        width: parse_field(path, "width", width)?,
        height: parse_field(path, "height", height)?,
        ext: ext.to_string(),
    })
}

/// Parse `{dir}/{hash}-{ow}-{oh}-{w}-{h}-{x1}-{x2}-{y1}-{y2}{ext}`.
///
/// Only the syntax is checked here; crop bounds are validated when the
/// variant itself is built.
pub fn parse_variant_path(path: &str) -> Result<ParsedVariant, PathError> {
    let (dir, stem, ext) = split_path(path);
    let slices: Vec<&str> = stem.split('-').collect();
    let [hash, ow, oh, w, h, x1, x2, y1, y2] = slices.as_slice() else {
        return Err(PathError::new(
            path,
            format!("expected 9 dash-separated fields, found {}", slices.len()),
        ));
    };
    Ok(ParsedVariant {
        original: ParsedOriginal {
            dir: dir.to_string(),
            hash: parse_hash(path, hash)?.to_string(),
            width: parse_field(path, "original width", ow)?,
            height: parse_field(path, "original height", oh)?,
            ext: ext.to_string(),
        },
        width: parse_field(path, "width", w)?,
        height: parse_field(path, "height", h)?,
        x1: parse_field(path, "x1", x1)?,
        x2: parse_field(path, "x2", x2)?,
        y1: parse_field(path, "y1", y1)?,
        y2: parse_field(path, "y2", y2)?,
    })
}

//! # Managed Image
//!
//! Content-addressed storage for uploaded images, plus authenticated, lazily
//! generated variants (resized and cropped derivatives) of them.
//!
//! # Architecture: Names Are the Data
//!
//! Nothing about an image lives outside its path. An original is stored as
//!
//! ```text
//! {dir}/{sha256}-{width}-{height}.{ext}
//! ```
//!
//! and every variant is named by its original plus a target size and a crop
//! window in integer percent of the original:
//!
//! ```text
//! {dir}/{sha256}-{width}-{height}-{vw}-{vh}-{x1}-{x2}-{y1}-{y2}.{ext}
//! ```
//!
//! So any variant path can be parsed back into everything needed to render
//! it, and no database or manifest is required:
//!
//! ```text
//! 1. Ingest    upload bytes  →  original path     (hash + identify + store)
//! 2. Describe  original + op →  variant URL?q=…   (geometry only, no pixels)
//! 3. Deliver   path + digest →  bytes             (render on first request)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Pure resize math: exact, fit, fill, fill-at, reframe, crop windows |
//! | [`naming`] | Original and variant path formats, builders and parsers |
//! | [`digest`] | Path digests (plain or salted HMAC) and constant-time verification |
//! | [`original`] | The [`original::Original`] value and its variant-deriving operations |
//! | [`variant`] | The [`variant::Variant`] value, its path, digest and descriptor |
//! | [`storage`] | Create-if-absent blob storage: local directory or in-memory |
//! | [`imaging`] | Decode, crop, resize and encode through the `image` crate |
//! | [`engine`] | Lazy generation, delivery and parallel warming |
//! | [`ingest`] | Upload validation, downsizing and content-addressed storing |
//! | [`handlers`] | Request-shaped entry points with input clamping and status codes |
//! | [`config`] | `config.toml` loading, stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Digest-Gated Generation
//!
//! Rendering costs CPU and storage, and variant paths are predictable. A
//! variant is only rendered when its request carries the digest of its path
//! (`?q=`), which only this process can produce when a salt is configured.
//! Once bytes exist they are served to anyone who knows the path: the digest
//! gates work, not reads.
//!
//! ## Create-If-Absent Instead of Locks
//!
//! Rendering is deterministic for a given path, so two requests racing on the
//! same missing variant produce identical bytes. Storage keeps whichever write
//! lands first and the other is dropped. The engine holds no locks.
//!
//! ## Percent Crop Windows
//!
//! Crop windows are stored as integer percents so they fit in a filename and
//! stay meaningful if the original is ever re-encoded at the same size.
//! Rounding is half-down, so a centred fill of 640x480 into a square is
//! `12-87`, not `13-88`.

pub mod config;
pub mod digest;
pub mod engine;
pub mod geometry;
pub mod handlers;
pub mod imaging;
pub mod ingest;
pub mod naming;
pub mod original;
pub mod output;
pub mod storage;
pub mod variant;

#[cfg(test)]
pub(crate) mod test_helpers;

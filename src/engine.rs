//! Authenticated lazy generation of variants.
//!
//! [`VariantEngine`] owns the two storages (originals and variants), the
//! codec, and the digest key. Everything it does for a single variant goes
//! through [`VariantEngine::ensure_generated`]:
//!
//! ```text
//! variant path ── exists? ──yes──▶ Cached (no codec work, no auth check)
//!                    │
//!                    no
//!                    ▼
//!             authenticated? ──no──▶ AuthenticationError (nothing written)
//!                    │
//!                    yes
//!                    ▼
//!     get original → decode → crop → resize → encode → create-if-absent
//!                    │
//!                    ▼
//!                Generated
//! ```
//!
//! The engine holds no locks and keeps no mutable state of its own. Two
//! callers racing on the same missing variant both render it; the storage's
//! create-if-absent keeps the first write, and since rendering is
//! deterministic the bytes are the same either way.
//!
//! [`VariantEngine::warm`] renders a batch in parallel with rayon and tallies
//! outcomes in a [`GenerationStats`].

use crate::config::{ConfigError, EngineConfig, LimitsConfig};
use crate::digest::DigestKey;
use crate::imaging::{
    CodecError, Dimensions, ImageCodec, Quality, RustCodec, plan_render, render_variant,
};
use crate::naming::PathError;
use crate::original::Original;
use crate::storage::{LocalStorage, Storage, StorageError};
use crate::variant::{Variant, VariantDescriptor, VariantError};
use rayon::prelude::*;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Served when an original's extension maps to no known image type.
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Variant {path} has not been authenticated")]
    Authentication { path: String },
    #[error(transparent)]
    Variant(#[from] VariantError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("No image format for extension {0:?}")]
    UnsupportedFormat(String),
}

/// How [`VariantEngine::ensure_generated`] resolved a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// Bytes were already stored.
    Cached,
    /// Bytes were rendered and handed to storage.
    Generated,
}

/// Bytes plus content type, ready to hand to an HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Derives and caches variants of stored originals.
#[derive(Debug)]
pub struct VariantEngine<S: Storage, C: ImageCodec = RustCodec> {
    key: DigestKey,
    originals: S,
    variants: S,
    codec: C,
    limits: LimitsConfig,
    quality: Quality,
}

impl VariantEngine<LocalStorage, RustCodec> {
    /// Engine over the configured local directories with the pure Rust codec.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::new(
            config,
            LocalStorage::new(&config.originals.root, config.originals.url.clone()),
            LocalStorage::new(&config.variants.root, config.variants.url.clone()),
            RustCodec::new(),
        )
    }
}

impl<S: Storage, C: ImageCodec> VariantEngine<S, C> {
    pub fn new(
        config: &EngineConfig,
        originals: S,
        variants: S,
        codec: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let key = DigestKey::from_salt(config.salt.as_deref())
            .map_err(|e| ConfigError::Validation(format!("salt: {}", e)))?;
        Ok(Self {
            key,
            originals,
            variants,
            codec,
            limits: config.limits.clone(),
            quality: Quality::new(config.encoding.quality),
        })
    }

    pub fn key(&self) -> &DigestKey {
        &self.key
    }

    pub fn originals(&self) -> &S {
        &self.originals
    }

    pub fn variants(&self) -> &S {
        &self.variants
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Look up an original by its canonical path.
    pub fn original(&self, path: &str) -> Result<Original, EngineError> {
        Ok(Original::from_path(path)?)
    }

    /// Rebuild a variant from a requested path and its `q` digest.
    pub fn variant_from_path(&self, path: &str, digest: &str) -> Result<Variant, EngineError> {
        Ok(Variant::from_path(path, digest, &self.key)?)
    }

    /// Delivery URL: variant storage base + path + `?q=` + digest.
    pub fn url(&self, variant: &Variant) -> String {
        self.variants.url_for(&variant.path_with_query(&self.key))
    }

    pub fn describe(&self, variant: &Variant) -> VariantDescriptor {
        variant.descriptor(&self.key, self.url(variant))
    }

    pub fn exists(&self, variant: &Variant) -> Result<bool, EngineError> {
        Ok(self.variants.exists(&variant.path())?)
    }

    /// Make sure the variant's bytes are stored, rendering them if needed.
    pub fn ensure_generated(&self, variant: &Variant) -> Result<Generation, EngineError> {
        let path = variant.path();
        if self.variants.exists(&path)? {
            debug!(path = %path, "variant cache hit");
            return Ok(Generation::Cached);
        }
        if !variant.is_authenticated() {
            warn!(path = %path, "refusing to generate unauthenticated variant");
            return Err(EngineError::Authentication { path });
        }

        let original = variant.original();
        let format = original
            .output_format()
            .ok_or_else(|| EngineError::UnsupportedFormat(original.extname().to_string()))?;
        let source = self.originals.get(original.path())?;
        let params = plan_render(
            Dimensions {
                width: original.width(),
                height: original.height(),
            },
            variant.crop(),
            variant.width(),
            variant.height(),
            format,
            self.quality,
        );
        let bytes = render_variant(&self.codec, &source, &params)?;
        self.variants.create(&path, &bytes)?;

        info!(
            path = %path,
            width = variant.width(),
            height = variant.height(),
            size = bytes.len(),
            "variant generated"
        );
        Ok(Generation::Generated)
    }

    /// Stored bytes of the variant, generating them first if absent.
    pub fn blob(&self, variant: &Variant) -> Result<Vec<u8>, EngineError> {
        self.ensure_generated(variant)?;
        Ok(self.variants.get(&variant.path())?)
    }

    pub fn handle<'a>(&'a self, variant: &'a Variant) -> VariantHandle<'a, S, C> {
        VariantHandle {
            engine: self,
            variant,
        }
    }

    /// Serve a requested variant path.
    ///
    /// Existing bytes are served whatever the digest; a missing variant is
    /// only rendered when the digest matches.
    pub fn deliver(&self, path: &str, digest: &str) -> Result<Delivery, EngineError> {
        let variant = self.variant_from_path(path, digest)?;
        let bytes = self.blob(&variant)?;
        Ok(Delivery {
            bytes,
            mime_type: variant.mime_type().unwrap_or(FALLBACK_MIME_TYPE),
        })
    }

    /// Generate a batch of variants in parallel.
    ///
    /// Failures do not stop the batch; each is reported with its path.
    pub fn warm(&self, variants: &[Variant]) -> WarmReport {
        let outcomes: Vec<(String, Result<Generation, EngineError>)> = variants
            .par_iter()
            .map(|v| (v.path(), self.ensure_generated(v)))
            .collect();

        let mut report = WarmReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(Generation::Cached) => report.stats.hit(),
                Ok(Generation::Generated) => report.stats.generate(),
                Err(e) => {
                    report.stats.fail();
                    report.failures.push((path, e));
                }
            }
        }
        info!(stats = %report.stats, "warm finished");
        report
    }
}

/// A variant bound to the engine that can produce it.
pub struct VariantHandle<'a, S: Storage, C: ImageCodec> {
    engine: &'a VariantEngine<S, C>,
    variant: &'a Variant,
}

impl<S: Storage, C: ImageCodec> VariantHandle<'_, S, C> {
    pub fn variant(&self) -> &Variant {
        self.variant
    }

    pub fn exists(&self) -> Result<bool, EngineError> {
        self.engine.exists(self.variant)
    }

    pub fn ensure_generated(&self) -> Result<Generation, EngineError> {
        self.engine.ensure_generated(self.variant)
    }

    pub fn blob(&self) -> Result<Vec<u8>, EngineError> {
        self.engine.blob(self.variant)
    }

    pub fn url(&self) -> String {
        self.engine.url(self.variant)
    }
}

/// Outcome counts for a batch of generation requests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStats {
    pub cached: u32,
    pub generated: u32,
    pub failed: u32,
}

impl GenerationStats {
    pub fn hit(&mut self) {
        self.cached += 1;
    }

    pub fn generate(&mut self) {
        self.generated += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.cached + self.generated + self.failed
    }
}

impl fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cached > 0 || self.failed > 0 {
            write!(f, "{} cached, {} generated", self.cached, self.generated)?;
            if self.failed > 0 {
                write!(f, ", {} failed", self.failed)?;
            }
            write!(f, " ({} total)", self.total())
        } else {
            write!(f, "{} generated", self.generated)
        }
    }
}

#[derive(Debug, Default)]
pub struct WarmReport {
    pub stats: GenerationStats,
    pub failures: Vec<(String, EngineError)>,
}

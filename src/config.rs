//! Engine configuration.
//!
//! Loaded from a single `config.toml`, merged over stock defaults, and
//! validated before an engine is built. The resulting [`EngineConfig`] is
//! passed into [`VariantEngine::new`](crate::engine::VariantEngine::new); there
//! is no global configuration.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # salt = "change-me"     # HMAC key for variant digests (unset = plain SHA-256)
//!
//! [originals]
//! root = "storage/originals"
//! url = "/originals"
//!
//! [variants]
//! root = "storage/variants"
//! url = "/variants"
//!
//! [limits]
//! max_file_size = 26214400          # Upload size limit in bytes (25 MiB)
//! max_upload_size = [5000, 5000]    # Largest accepted upload, in pixels
//! max_original_size = [2560, 2560]  # Uploads are downsized to fit this box
//! max_variant_size = [1600, 1600]   # Handler requests are clamped to this box
//!
//! [encoding]
//! quality = 90                      # JPEG/AVIF quality (1-100)
//!
//! [processing]
//! max_processes = 4                 # Parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Secret mixed into variant digests. Unset keeps plain SHA-256 digests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// Where originals are stored and served from.
    pub originals: StorageConfig,
    /// Where generated variants are stored and served from.
    pub variants: StorageConfig,
    /// Upload and request size limits.
    pub limits: LimitsConfig,
    /// Encoder settings.
    pub encoding: EncodingConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            salt: None,
            originals: StorageConfig::originals(),
            variants: StorageConfig::variants(),
            limits: LimitsConfig::default(),
            encoding: EncodingConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoding.quality) {
            return Err(ConfigError::Validation(
                "encoding.quality must be 1-100".into(),
            ));
        }
        if self.limits.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "limits.max_file_size must be non-zero".into(),
            ));
        }
        for (name, size) in [
            ("max_upload_size", self.limits.max_upload_size),
            ("max_original_size", self.limits.max_original_size),
            ("max_variant_size", self.limits.max_variant_size),
        ] {
            if size[0] == 0 || size[1] == 0 {
                return Err(ConfigError::Validation(format!(
                    "limits.{} values must be non-zero",
                    name
                )));
            }
        }
        for (name, storage) in [("originals", &self.originals), ("variants", &self.variants)] {
            if storage.root.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{}.root must not be empty",
                    name
                )));
            }
        }
        if self.originals.root == self.variants.root {
            return Err(ConfigError::Validation(
                "originals.root and variants.root must differ".into(),
            ));
        }
        Ok(())
    }
}

/// A storage location: filesystem root plus public base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub root: String,
    pub url: String,
}

impl StorageConfig {
    fn originals() -> Self {
        Self {
            root: "storage/originals".into(),
            url: "/originals".into(),
        }
    }

    fn variants() -> Self {
        Self {
            root: "storage/variants".into(),
            url: "/variants".into(),
        }
    }
}

/// Upload and request size limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest accepted upload in bytes.
    pub max_file_size: u64,
    /// Largest accepted upload as `[width, height]`.
    pub max_upload_size: [u32; 2],
    /// Stored originals are downsized to fit inside this box.
    pub max_original_size: [u32; 2],
    /// Handler requests clamp variant dimensions to this box.
    pub max_variant_size: [u32; 2],
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 25 * 1024 * 1024,
            max_upload_size: [5000, 5000],
            max_original_size: [2560, 2560],
            max_variant_size: [1600, 1600],
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// Lossy encoding quality (1-100).
    pub quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel generation workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Stock defaults as a TOML value, the base every overlay merges onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(EngineConfig::default())?)
}

/// Deep-merge two TOML values. Tables merge key by key; anything else in
/// `overlay` replaces `base`.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. A missing file is `Ok(None)`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, deserialize, and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path` over stock defaults.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// A documented config file with every default spelled out.
pub fn stock_config_toml() -> &'static str {
    r##"# Managed Image Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Secret key for variant URL digests. When unset, digests are the plain
# SHA-256 of the variant path and anyone can mint a valid URL.
# salt = "change-me"

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[originals]
# Directory holding uploaded originals.
root = "storage/originals"
# Public base URL the directory is served from.
url = "/originals"

[variants]
# Directory holding generated variants.
root = "storage/variants"
# Public base URL the directory is served from.
url = "/variants"

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Largest accepted upload in bytes (25 MiB).
max_file_size = 26214400

# Largest accepted upload as [width, height] in pixels.
max_upload_size = [5000, 5000]

# Originals larger than this are downsized (aspect preserved) on upload.
max_original_size = [2560, 2560]

# Resize requests are clamped to this box.
max_variant_size = [1600, 1600]

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG/AVIF quality (1 = worst, 100 = best). PNG/TIFF/WebP are lossless.
quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel generation workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.salt, None);
        assert_eq!(config.originals.root, "storage/originals");
        assert_eq!(config.variants.url, "/variants");
        assert_eq!(config.limits.max_file_size, 26_214_400);
        assert_eq!(config.limits.max_upload_size, [5000, 5000]);
        assert_eq!(config.limits.max_original_size, [2560, 2560]);
        assert_eq!(config.limits.max_variant_size, [1600, 1600]);
        assert_eq!(config.encoding.quality, 90);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
salt = "pepper"

[variants]
root = "/srv/variants"
url = "https://cdn.example.com/v"
"##;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.salt.as_deref(), Some("pepper"));
        assert_eq!(config.variants.url, "https://cdn.example.com/v");
        // Untouched sections keep their defaults
        assert_eq!(config.originals.root, "storage/originals");
        assert_eq!(config.encoding.quality, 90);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<EngineConfig, _> = toml::from_str("[limits]\nmax_pixels = 4\n");
        assert!(result.is_err());
        let result: Result<EngineConfig, _> = toml::from_str("sallt = \"typo\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // validate
    // =========================================================================

    #[test]
    fn validate_rejects_quality_out_of_range() {
        let mut config = EngineConfig::default();
        config.encoding.quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.encoding.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = EngineConfig::default();
        config.limits.max_variant_size = [0, 100];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_variant_size"));
    }

    #[test]
    fn validate_rejects_shared_roots() {
        let mut config = EngineConfig::default();
        config.variants.root = config.originals.root.clone();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge + load
    // =========================================================================

    #[test]
    fn merge_toml_overlays_nested_keys() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[limits]\nmax_file_size = 10\n").unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.limits.max_file_size, 10);
        assert_eq!(config.limits.max_upload_size, [5000, 5000]);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.encoding.quality, 90);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r##"
[encoding]
quality = 75

[originals]
root = "uploads"
url = "http://localhost/uploads"
"##,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.encoding.quality, 75);
        assert_eq!(config.originals.root, "uploads");
        assert_eq!(config.variants.root, "storage/variants");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_runs_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[encoding]\nquality = 500\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: EngineConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = EngineConfig::default();
        assert_eq!(config.originals, defaults.originals);
        assert_eq!(config.variants, defaults.variants);
        assert_eq!(config.limits, defaults.limits);
        assert_eq!(config.encoding.quality, defaults.encoding.quality);
        assert_eq!(config.salt, None);
    }

    #[test]
    fn effective_threads_caps_at_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 10),
        };
        assert_eq!(effective_threads(&config), cores);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }
}

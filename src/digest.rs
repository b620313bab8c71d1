//! Authentication digests over canonical paths.
//!
//! A variant URL carries `?q={digest}` where the digest is computed from the
//! variant's canonical path. The server only performs image work for a path
//! whose digest it can reproduce, so clients cannot make it render arbitrary
//! width/height/crop combinations.
//!
//! # Keys
//!
//! - [`DigestKey::Unsalted`]: SHA-256 of the path. Anyone who knows the hash
//!   function can mint a digest for any path they construct.
//! - [`DigestKey::Salted`]: HMAC-SHA256 keyed by a server-side salt. Digests
//!   cannot be forged without the salt.
//!
//! Both produce 64 lowercase hex characters. Comparison is constant-time.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Length of every digest in hex characters.
pub const DIGEST_LEN: usize = 64;

/// A path digest as carried in a `?q=` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AuthDigest(String);

impl AuthDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How digests are minted.
#[derive(Clone, Default)]
pub enum DigestKey {
    #[default]
    Unsalted,
    /// Keyed MAC, initialised once and cloned per digest.
    Salted(HmacSha256),
}

impl fmt::Debug for DigestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsalted => f.write_str("Unsalted"),
            Self::Salted(_) => f.write_str("Salted(..)"),
        }
    }
}

impl DigestKey {
    /// Build from an optional configured salt. An empty salt counts as none.
    pub fn from_salt(salt: Option<&str>) -> Result<Self, InvalidLength> {
        match salt {
            Some(s) if !s.is_empty() => {
                Ok(Self::Salted(HmacSha256::new_from_slice(s.as_bytes())?))
            }
            _ => Ok(Self::Unsalted),
        }
    }

    /// Digest of a canonical path.
    pub fn digest_for(&self, path: &str) -> AuthDigest {
        let hex = match self {
            Self::Unsalted => format!("{:x}", Sha256::digest(path.as_bytes())),
            Self::Salted(keyed) => {
                let mut mac = keyed.clone();
                mac.update(path.as_bytes());
                format!("{:x}", mac.finalize().into_bytes())
            }
        };
        AuthDigest(hex)
    }

    /// Whether `supplied` is the digest of `path`.
    pub fn verify(&self, path: &str, supplied: &str) -> bool {
        let expected = self.digest_for(path);
        expected.0.as_bytes().ct_eq(supplied.as_bytes()).into()
    }
}

/// SHA-256 of a byte buffer as hex. Used for content-addressed original names.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

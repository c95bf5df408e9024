//! Transform cache keys.
//!
//! A key is a BLAKE3 hash of the file path and its *normalized* transform
//! options, so requests that differ only in options the file never reads
//! share one cache entry.

use blake3::Hasher;

use crate::error::Result;
use crate::normalize::{canonical_separators, normalize};
use crate::options::TransformOptions;

/// Current key format version. Increment when the hashed layout changes.
const CACHE_FORMAT_VERSION: u32 = 1;

/// Content-addressed transform cache key (BLAKE3 hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the transform cache key for `path` compiled with `options`.
///
/// The key is a BLAKE3 hash of:
/// 1. Cache format version
/// 2. The path with canonical separators
/// 3. The JSON encoding of the normalized options
pub fn transform_cache_key(path: &str, options: &TransformOptions) -> Result<CacheKey> {
    let normalized = normalize(path, options);
    normalized_cache_key(path, &normalized)
}

/// Key for options that were already normalized for `path`.
pub fn normalized_cache_key(path: &str, normalized: &TransformOptions) -> Result<CacheKey> {
    let mut hasher = Hasher::new();

    hasher.update(&CACHE_FORMAT_VERSION.to_le_bytes());

    hasher.update(canonical_separators(path).as_bytes());
    hasher.update(b"\0");

    // Struct fields serialize in declaration order and the pass-through bags
    // are BTreeMaps, so the encoding is canonical.
    let encoded = serde_json::to_vec(normalized)?;
    hasher.update(&encoded);

    Ok(CacheKey(hasher.finalize().to_hex().to_string()))
}

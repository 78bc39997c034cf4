//! # Hasher Module
//!
//! Full-content digests for exact duplicate detection.
//!
//! BLAKE3 is used for every file so digests from one run are comparable.
//! Two files with equal digests are treated as byte-identical; the
//! collision risk is accepted rather than confirmed by a byte comparison.

mod mmap_read;

pub use mmap_read::MMAP_THRESHOLD;

use crate::error::HashError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;

/// 256-bit BLAKE3 digest of a file's content
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl From<blake3::Hash> for ContentDigest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Serialized as its hex rendering
impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", &self.to_hex()[..16])
    }
}

/// Hash the full content of `path`
pub fn hash_file(path: &Path) -> Result<ContentDigest, HashError> {
    let mut hasher = blake3::Hasher::new();
    mmap_read::update_from_file(&mut hasher, path)?;
    Ok(hasher.finalize().into())
}

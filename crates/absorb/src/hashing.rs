//! Content identity
//!
//! Loose files and package entries are compared by the xxHash64 of their full
//! contents, rendered as base64 of the little-endian digest.

use serde::{Serialize, Serializer};
use xxhash_rust::xxh64::Xxh64;

/// xxHash64 digest, little-endian bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 8]);

impl ContentHash {
    /// Hash a complete in-memory buffer
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Xxh64::new(0);
        hasher.update(data);
        Self::from_digest(hasher.digest())
    }

    pub fn from_digest(digest: u64) -> Self {
        ContentHash(digest.to_le_bytes())
    }

    pub fn to_base64(&self) -> String {
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

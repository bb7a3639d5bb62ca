//! Exact-match content digest.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::error::{Result, StegoSealError};

/// Digest size in bytes.
pub const CONTENT_DIGEST_SIZE: usize = 32;

/// SHA3-256 of the raw encoded file bytes.
///
/// Two files share a digest only if they are byte-identical, so this is the
/// identity key for exact deduplication. Near-duplicates are the job of
/// [`crate::fingerprint::FingerprintSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentDigest([u8; CONTENT_DIGEST_SIZE]);

impl ContentDigest {
    /// Digest raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut digest = [0u8; CONTENT_DIGEST_SIZE];
        digest.copy_from_slice(&result);
        Self(digest)
    }

    /// Digest a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(&data))
    }

    pub fn as_bytes(&self) -> &[u8; CONTENT_DIGEST_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| StegoSealError::InvalidHex(format!("{}: {}", hex_str, e)))?;
        let digest: [u8; CONTENT_DIGEST_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
            StegoSealError::InvalidHex(format!(
                "content digest must be {} bytes, got {}",
                CONTENT_DIGEST_SIZE,
                b.len()
            ))
        })?;
        Ok(Self(digest))
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.to_hex()
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = StegoSealError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

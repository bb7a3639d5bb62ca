//! Perceptual hashing for images.
//!
//! This module computes fingerprints that stay close, in Hamming distance,
//! for visually similar images even after re-encoding, recompression or
//! resizing.
//!
//! # Algorithms
//!
//! All three run through `image_hasher` on an 8-bit grayscale copy of the
//! image, resampled with a Lanczos3 filter, and produce 64 bits:
//!
//! - **Average hash** (`HashAlg::Mean`): 8×8 grid against its mean.
//! - **Difference hash** (`HashAlg::Gradient`): 9×8 grid, each cell against
//!   its horizontal neighbour.
//! - **DCT hash** (`HashAlg::Median` with DCT preprocessing): 16×16 grid,
//!   low-frequency 8×8 block against its median.
//!
//! # Usage
//!
//! ```no_run
//! use stegoseal_core::fingerprint::{HashAlgorithm, PerceptualHasher};
//!
//! let image_data = std::fs::read("image.png").unwrap();
//! let hasher = PerceptualHasher::new(HashAlgorithm::DctHash);
//! let hash1 = hasher.hash_bytes(&image_data).unwrap();
//!
//! let image_data2 = std::fs::read("image2.png").unwrap();
//! let hash2 = hasher.hash_bytes(&image_data2).unwrap();
//! let distance = hash1.hamming_distance(&hash2).unwrap();
//! let similar = distance <= 10;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StegoSealError};
use crate::pixels::PixelBuffer;

/// Fixed hash size in bytes (64 bits = 8 bytes).
pub const PERCEPTUAL_HASH_SIZE: usize = 8;

/// Hash grid side; 8×8 bits.
const HASH_GRID: u32 = 8;

/// Default maximum Hamming distance for [`PerceptualHash::is_similar`].
pub const DEFAULT_SIMILARITY_THRESHOLD: u32 = 10;

/// Perceptual hash algorithm selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum HashAlgorithm {
    /// Mean-thresholded 8×8 grid.
    #[serde(rename = "ahash")]
    AverageHash,
    /// Horizontal gradient over a 9×8 grid.
    #[serde(rename = "dhash")]
    DifferenceHash,
    /// Median-thresholded low-frequency DCT block.
    #[default]
    #[serde(rename = "phash")]
    DctHash,
}

impl HashAlgorithm {
    /// Every supported algorithm, in a fixed order.
    pub const ALL: [HashAlgorithm; 3] = [
        HashAlgorithm::AverageHash,
        HashAlgorithm::DifferenceHash,
        HashAlgorithm::DctHash,
    ];

    /// Short name used as a storage key.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::AverageHash => "ahash",
            HashAlgorithm::DifferenceHash => "dhash",
            HashAlgorithm::DctHash => "phash",
        }
    }

    fn hasher(self) -> Hasher {
        let config = HasherConfig::new()
            .hash_size(HASH_GRID, HASH_GRID)
            .resize_filter(FilterType::Lanczos3);
        match self {
            HashAlgorithm::AverageHash => config.hash_alg(HashAlg::Mean),
            HashAlgorithm::DifferenceHash => config.hash_alg(HashAlg::Gradient),
            HashAlgorithm::DctHash => config.hash_alg(HashAlg::Median).preproc_dct(),
        }
        .to_hasher()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = StegoSealError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ahash" | "average" => Ok(HashAlgorithm::AverageHash),
            "dhash" | "difference" => Ok(HashAlgorithm::DifferenceHash),
            "phash" | "dct" => Ok(HashAlgorithm::DctHash),
            other => Err(StegoSealError::FingerprintMismatch(format!(
                "unknown hash algorithm '{}'",
                other
            ))),
        }
    }
}

/// Computed perceptual hash with metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualHash {
    /// The hash bytes (8 bytes for every built-in algorithm)
    pub hash: Vec<u8>,
    /// Algorithm used to compute the hash
    pub algorithm: HashAlgorithm,
    /// Hash size in bits
    pub bit_size: u32,
}

impl PerceptualHash {
    /// Create a new perceptual hash from fixed-size bytes.
    pub fn new(hash: [u8; PERCEPTUAL_HASH_SIZE], algorithm: HashAlgorithm) -> Self {
        Self {
            hash: hash.to_vec(),
            algorithm,
            bit_size: (PERCEPTUAL_HASH_SIZE * 8) as u32,
        }
    }

    /// Create from variable-size bytes.
    pub(crate) fn from_bytes(hash: Vec<u8>, algorithm: HashAlgorithm) -> Self {
        let bit_size = (hash.len() * 8) as u32;
        Self {
            hash,
            algorithm,
            bit_size,
        }
    }

    /// Compute the Hamming distance between two perceptual hashes.
    ///
    /// Hashes must come from the same algorithm and have the same length;
    /// anything else is a caller bug and is reported as
    /// [`StegoSealError::FingerprintMismatch`].
    pub fn hamming_distance(&self, other: &Self) -> Result<u32> {
        if self.algorithm != other.algorithm {
            return Err(StegoSealError::FingerprintMismatch(format!(
                "cannot compare {} against {}",
                self.algorithm, other.algorithm
            )));
        }

        hamming_distance(&self.hash, &other.hash).ok_or_else(|| {
            StegoSealError::FingerprintMismatch(format!(
                "{} hash lengths differ or are empty ({} vs {} bytes)",
                self.algorithm,
                self.hash.len(),
                other.hash.len()
            ))
        })
    }

    /// Check if two images are similar based on Hamming distance threshold.
    ///
    /// # Arguments
    ///
    /// * `other` - The other hash to compare against
    /// * `threshold` - Maximum Hamming distance to consider similar (default: 10)
    pub fn is_similar(&self, other: &Self, threshold: Option<u32>) -> Result<bool> {
        let threshold = threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);
        let distance = self.hamming_distance(other)?;
        Ok(distance <= threshold)
    }

    /// Get the hash as a hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.hash)
    }

    /// Create a perceptual hash from a hexadecimal string.
    pub fn from_hex(hex_str: &str, algorithm: HashAlgorithm) -> Result<Self> {
        let hash = hex::decode(hex_str)
            .map_err(|e| StegoSealError::InvalidHex(format!("{}: {}", hex_str, e)))?;
        Ok(Self::from_bytes(hash, algorithm))
    }
}

/// Fingerprints of one image keyed by algorithm.
///
/// Serialized as a map from algorithm name to hex string, e.g.
/// `{"ahash": "ffe0...", "phash": "9c3a..."}`, which is also the shape the
/// external store persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<HashAlgorithm, String>",
    into = "BTreeMap<HashAlgorithm, String>"
)]
pub struct FingerprintSet {
    hashes: BTreeMap<HashAlgorithm, PerceptualHash>,
}

impl FingerprintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hash, replacing any previous hash of the same algorithm.
    pub fn insert(&mut self, hash: PerceptualHash) {
        self.hashes.insert(hash.algorithm, hash);
    }

    pub fn get(&self, algorithm: HashAlgorithm) -> Option<&PerceptualHash> {
        self.hashes.get(&algorithm)
    }

    pub fn contains(&self, algorithm: HashAlgorithm) -> bool {
        self.hashes.contains_key(&algorithm)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn algorithms(&self) -> impl Iterator<Item = HashAlgorithm> + '_ {
        self.hashes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PerceptualHash> {
        self.hashes.values()
    }

    /// Serialize to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)
            .map_err(|e| StegoSealError::SerializationError(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| StegoSealError::SerializationError(e.to_string()))
    }
}

impl FromIterator<PerceptualHash> for FingerprintSet {
    fn from_iter<I: IntoIterator<Item = PerceptualHash>>(iter: I) -> Self {
        let mut set = FingerprintSet::new();
        for hash in iter {
            set.insert(hash);
        }
        set
    }
}

impl TryFrom<BTreeMap<HashAlgorithm, String>> for FingerprintSet {
    type Error = StegoSealError;

    fn try_from(map: BTreeMap<HashAlgorithm, String>) -> Result<Self> {
        map.into_iter()
            .map(|(alg, hex_str)| PerceptualHash::from_hex(&hex_str, alg))
            .collect()
    }
}

impl From<FingerprintSet> for BTreeMap<HashAlgorithm, String> {
    fn from(set: FingerprintSet) -> Self {
        set.hashes
            .into_iter()
            .map(|(alg, hash)| (alg, hash.to_hex()))
            .collect()
    }
}

/// Perceptual hasher configuration and computation.
#[derive(Debug, Clone, Default)]
pub struct PerceptualHasher {
    algorithm: HashAlgorithm,
}

impl PerceptualHasher {
    /// Create a new perceptual hasher with the specified algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Compute perceptual hash from encoded image bytes.
    ///
    /// Supports JPEG, PNG, GIF, and WebP formats.
    #[cfg(feature = "image-io")]
    pub fn hash_bytes(&self, image_data: &[u8]) -> Result<PerceptualHash> {
        let buffer = crate::image_io::decode_bytes(image_data)?;
        self.hash_buffer(&buffer)
    }

    /// Compute perceptual hash from an already decoded image.
    #[cfg(feature = "image-io")]
    pub fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHash> {
        self.hash_buffer(&PixelBuffer::from_dynamic(image)?)
    }

    /// Compute perceptual hash from a pixel buffer.
    pub fn hash_buffer(&self, buffer: &PixelBuffer) -> Result<PerceptualHash> {
        if buffer.width() == 0 || buffer.height() == 0 {
            return Err(StegoSealError::InvalidPixelBuffer(
                "cannot hash an empty image".into(),
            ));
        }

        let gray = GrayImage::from_raw(buffer.width(), buffer.height(), buffer.to_luma8())
            .ok_or_else(|| StegoSealError::InvalidPixelBuffer("grayscale conversion failed".into()))?;
        let hash = self
            .algorithm
            .hasher()
            .hash_image(&DynamicImage::ImageLuma8(gray));

        let bytes: [u8; PERCEPTUAL_HASH_SIZE] = hash.as_bytes().try_into().map_err(|_| {
            StegoSealError::FingerprintMismatch(format!(
                "{} produced {} bytes, expected {}",
                self.algorithm,
                hash.as_bytes().len(),
                PERCEPTUAL_HASH_SIZE
            ))
        })?;
        Ok(PerceptualHash::new(bytes, self.algorithm))
    }

    /// Get the algorithm used by this hasher.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

/// Compute every built-in fingerprint of a buffer.
pub fn fingerprint(buffer: &PixelBuffer) -> Result<FingerprintSet> {
    HashAlgorithm::ALL
        .iter()
        .map(|&alg| PerceptualHasher::new(alg).hash_buffer(buffer))
        .collect()
}

/// Compute Hamming distance between two perceptual hash byte arrays.
///
/// # Returns
///
/// The number of differing bits, or `None` if either array is empty or the
/// lengths differ.
pub fn hamming_distance(hash1: &[u8], hash2: &[u8]) -> Option<u32> {
    if hash1.is_empty() || hash1.len() != hash2.len() {
        return None;
    }

    Some(
        hash1
            .iter()
            .zip(hash2.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum(),
    )
}

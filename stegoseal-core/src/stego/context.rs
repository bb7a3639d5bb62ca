//! Content-derived context signatures.
//!
//! A context signature is a short printable string computed only from pixel
//! values:
//!
//! ```text
//! CV:<DCT hash, 16 hex>-<SHA3-256 prefix, 16 hex>
//! ```
//!
//! Both halves read the image with the carrier LSBs of the payload cleared:
//! the first [`BitCodec::required_bits`] samples for the payload length being
//! embedded or read back. The signature computed before embedding therefore
//! equals the one recomputed on the signed image, while every other bit of
//! every sample, including the LSBs past the payload, feeds the digest.
//!
//! [`BitCodec::required_bits`]: crate::stego::BitCodec::required_bits

use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::error::Result;
use crate::fingerprint::{HashAlgorithm, PerceptualHasher};
use crate::pixels::PixelBuffer;

/// Marker every context signature starts with.
pub const CONTEXT_PREFIX: &str = "CV:";

/// Bytes of the SHA3-256 digest kept in the signature.
const DIGEST_PREFIX_BYTES: usize = 8;

/// Length in bytes of every generated signature.
pub const CONTEXT_SIGNATURE_LEN: usize = CONTEXT_PREFIX.len() + 16 + 1 + DIGEST_PREFIX_BYTES * 2;

/// Domain tag mixed into the digest.
const DIGEST_DOMAIN: &[u8] = b"stegoseal/context/v1";

/// A generated context signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSignature(String);

impl ContextSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether `value` carries the context marker.
    pub fn has_prefix(value: &str) -> bool {
        value.starts_with(CONTEXT_PREFIX)
    }
}

impl fmt::Display for ContextSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ContextSignature {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ContextSignature {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Derives context signatures from pixel content.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextSignatureGenerator;

impl ContextSignatureGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Compute the signature of `buffer`'s current pixels.
    ///
    /// `carrier_bits` is the number of leading samples whose LSB carries a
    /// payload; pass 0 for an image with nothing embedded. Depends on
    /// nothing but sample values, geometry and that count.
    pub fn generate(&self, buffer: &PixelBuffer, carrier_bits: u64) -> Result<ContextSignature> {
        let masked = buffer.with_carrier_cleared(carrier_bits);

        let phash = PerceptualHasher::new(HashAlgorithm::DctHash).hash_buffer(&masked)?;

        let mut hasher = Sha3_256::new();
        hasher.update(DIGEST_DOMAIN);
        hasher.update(masked.geometry_bytes());
        hasher.update(carrier_bits.to_be_bytes());
        for sample in masked.samples() {
            hasher.update(sample.to_be_bytes());
        }
        let digest = hasher.finalize();

        Ok(ContextSignature(format!(
            "{}{}-{}",
            CONTEXT_PREFIX,
            phash.to_hex(),
            hex::encode(&digest[..DIGEST_PREFIX_BYTES])
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::{BitDepth, ChannelLayout};

    fn pattern(width: u32, height: u32) -> PixelBuffer {
        let samples: Vec<u8> = (0..width * height * 3)
            .map(|i| ((i * 31 + i / 7) % 251) as u8)
            .collect();
        PixelBuffer::from_u8(width, height, ChannelLayout::Rgb, &samples).unwrap()
    }

    #[test]
    fn test_format() {
        let sig = ContextSignatureGenerator::new().generate(&pattern(40, 30), 0).unwrap();
        let s = sig.as_str();
        assert!(s.starts_with("CV:"));
        assert_eq!(s.len(), CONTEXT_SIGNATURE_LEN);
        assert_eq!(CONTEXT_SIGNATURE_LEN, 36);
        assert!(ContextSignature::has_prefix(s));
        assert!(!ContextSignature::has_prefix("alice"));
        assert_eq!(&s[19..20], "-");
        assert!(s[3..]
            .chars()
            .all(|c| c == '-' || c.is_ascii_hexdigit()));
        assert!(!s.contains("||"));
    }

    #[test]
    fn test_deterministic() {
        let generator = ContextSignatureGenerator::new();
        let buffer = pattern(40, 30);
        assert_eq!(
            generator.generate(&buffer, 96).unwrap(),
            generator.generate(&buffer.clone(), 96).unwrap()
        );
    }

    #[test]
    fn test_single_sample_change_changes_signature() {
        let generator = ContextSignatureGenerator::new();
        let buffer = pattern(40, 30);
        let mut modified = buffer.clone();
        let original = modified.sample(17, 9, 1).unwrap();
        modified.set_sample(17, 9, 1, original ^ 0x02).unwrap();

        assert_ne!(
            generator.generate(&buffer, 0).unwrap(),
            generator.generate(&modified, 0).unwrap()
        );
    }

    #[test]
    fn test_carrier_prefix_is_ignored() {
        let generator = ContextSignatureGenerator::new();
        let buffer = pattern(40, 30);
        let mut flipped = buffer.clone();
        for s in &mut flipped.samples_mut()[..200] {
            *s ^= 1;
        }
        assert_eq!(
            generator.generate(&buffer, 200).unwrap(),
            generator.generate(&flipped, 200).unwrap()
        );
    }

    #[test]
    fn test_lsb_past_carrier_changes_signature() {
        let generator = ContextSignatureGenerator::new();
        let buffer = pattern(40, 30);
        let mut flipped = buffer.clone();
        flipped.samples_mut()[200] ^= 1;
        assert_ne!(
            generator.generate(&buffer, 200).unwrap(),
            generator.generate(&flipped, 200).unwrap()
        );
    }

    #[test]
    fn test_carrier_length_is_bound() {
        let generator = ContextSignatureGenerator::new();
        let buffer = pattern(40, 30).with_carrier_cleared(u64::MAX);
        assert_ne!(
            generator.generate(&buffer, 64).unwrap(),
            generator.generate(&buffer, 72).unwrap()
        );
    }

    #[test]
    fn test_geometry_is_bound() {
        let generator = ContextSignatureGenerator::new();
        let wide = PixelBuffer::filled(8, 2, ChannelLayout::Luma, BitDepth::Eight, 64).unwrap();
        let tall = PixelBuffer::filled(2, 8, ChannelLayout::Luma, BitDepth::Eight, 64).unwrap();
        assert_ne!(generator.generate(&wide, 0).unwrap(), generator.generate(&tall, 0).unwrap());
    }

    #[test]
    fn test_empty_image_fails() {
        let empty = PixelBuffer::from_u8(0, 4, ChannelLayout::Rgb, &[]).unwrap();
        assert!(ContextSignatureGenerator::new().generate(&empty, 0).is_err());
    }
}

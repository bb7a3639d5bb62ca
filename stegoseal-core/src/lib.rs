//! StegoSeal Core - tamper-evident image signatures and near-duplicate search
//!
//! This crate embeds a content-derived signature into the pixels of raster
//! images, later tells whether an image changed since it was signed, and
//! finds perceptually similar images in a stored corpus.
//!
//! # Features
//!
//! - LSB payload codec with an explicit length header and bound check
//! - Deterministic `CV:` context signatures derived from pixel content only
//! - Sign / inspect / verify protocol with explicit result types
//! - Average, difference and DCT perceptual hashes
//! - Similarity search with configurable Hamming threshold
//! - SHA3-256 content digests for exact deduplication
//!
//! Everything here is synchronous and stateless; calls on separate buffers
//! can run concurrently without coordination.
//!
//! # Example
//!
//! ```no_run
//! use stegoseal_core::{image_io, sign, verify};
//!
//! # fn example() -> stegoseal_core::Result<()> {
//! let pixels = image_io::decode_path("photo.png")?;
//!
//! let signed = sign(&pixels, Some("alice"))?;
//! image_io::save_png(&signed.pixels, "photo.signed.png")?;
//!
//! let reread = image_io::decode_path("photo.signed.png")?;
//! let result = verify(&reread)?;
//! assert!(result.detected && !result.tampered);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "image-io")]
pub mod analysis;
pub mod error;
pub mod fingerprint;
#[cfg(feature = "image-io")]
pub mod image_io;
pub mod pixels;
pub mod stego;

// Re-export main types for convenience
#[cfg(feature = "image-io")]
pub use analysis::{analyze, ImageReport};
pub use error::{Result, StegoSealError};
pub use fingerprint::{
    find_similar, fingerprint, hamming_distance, ContentDigest, CorpusEntry, FingerprintSet,
    HashAlgorithm, PerceptualHash, PerceptualHasher, SimilarityConfig, SimilarityMatch,
};
#[cfg(feature = "image-io")]
pub use image_io::ImageMetadata;
pub use pixels::{BitDepth, ChannelLayout, PixelBuffer};
pub use stego::{
    parse_combined, BitCodec, ContextSignature, ContextSignatureGenerator, DetectionResult,
    Extraction, NotFoundReason, SignatureProtocol, SignedImage, Verdict, VerificationResult,
};

/// Sign `pixels`, optionally tagging them with a user signature.
pub fn sign(pixels: &PixelBuffer, user_signature: Option<&str>) -> Result<SignedImage> {
    SignatureProtocol::new().sign(pixels, user_signature)
}

/// Report whether `pixels` carry an embedded signature.
pub fn inspect(pixels: &PixelBuffer) -> DetectionResult {
    SignatureProtocol::new().inspect(pixels)
}

/// Check `pixels` against the signature they carry.
pub fn verify(pixels: &PixelBuffer) -> Result<VerificationResult> {
    SignatureProtocol::new().verify(pixels)
}

/// Compute every perceptual fingerprint of `pixels`.
pub fn hash(pixels: &PixelBuffer) -> Result<FingerprintSet> {
    fingerprint(pixels)
}

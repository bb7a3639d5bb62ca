//! One-shot analysis of an uploaded image.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::fingerprint::{
    find_similar, fingerprint, ContentDigest, CorpusEntry, FingerprintSet, SimilarityConfig,
    SimilarityMatch,
};
use crate::image_io::{decode_bytes, describe, ImageMetadata};
use crate::stego::{SignatureProtocol, VerificationResult};

/// Everything the core can say about an encoded image.
///
/// `verification` carries the detection outcome, the raw embedded payload
/// and both the embedded and the current context signatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReport {
    pub content_digest: ContentDigest,
    pub metadata: ImageMetadata,
    pub fingerprints: FingerprintSet,
    pub verification: VerificationResult,
    pub similar: Vec<SimilarityMatch>,
}

impl ImageReport {
    pub fn similar_found(&self) -> bool {
        !self.similar.is_empty()
    }
}

/// Decode `data` and run every check against the given corpus snapshot.
pub fn analyze(
    data: &[u8],
    corpus: &[CorpusEntry],
    config: &SimilarityConfig,
) -> Result<ImageReport> {
    let buffer = decode_bytes(data)?;
    let metadata = describe(data, &buffer)?;
    let protocol = SignatureProtocol::new();

    let fingerprints = fingerprint(&buffer)?;
    let verification = protocol.verify(&buffer)?;
    let similar = find_similar(&fingerprints, corpus, config);

    info!(
        width = metadata.width,
        height = metadata.height,
        detected = verification.detected,
        similar = similar.len(),
        "Analyzed image"
    );

    Ok(ImageReport {
        content_digest: ContentDigest::from_bytes(data),
        metadata,
        fingerprints,
        verification,
        similar,
    })
}

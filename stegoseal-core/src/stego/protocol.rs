//! Sign, inspect and verify images.
//!
//! Signing embeds `user || context` (or just `context`) into the carrier LSBs.
//! Verification extracts it, recomputes the context signature from the
//! pixels as they are now, and compares. Both sides mask exactly the
//! samples the payload occupies, so an edit to any other bit is tampering.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StegoSealError};
use crate::pixels::PixelBuffer;
use crate::stego::codec::{BitCodec, Extraction, NotFoundReason};
use crate::stego::context::{
    ContextSignature, ContextSignatureGenerator, CONTEXT_PREFIX, CONTEXT_SIGNATURE_LEN,
};

/// Separator between the user part and the context part.
pub const SIGNATURE_DELIMITER: &str = "||";

/// Output of [`SignatureProtocol::sign`].
#[derive(Debug, Clone)]
pub struct SignedImage {
    /// Copy of the input carrying the embedded signature.
    pub pixels: PixelBuffer,
    /// Exactly what was embedded.
    pub combined_signature: String,
    pub context_signature: ContextSignature,
}

/// Output of [`SignatureProtocol::inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detected: bool,
    pub raw_signature: Option<String>,
}

impl DetectionResult {
    fn not_detected() -> Self {
        Self {
            detected: false,
            raw_signature: None,
        }
    }
}

/// Overall outcome of a verification, derived from [`VerificationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Embedded context signature matches the current pixels.
    Authentic,
    /// Embedded context signature no longer matches.
    Tampered,
    /// Nothing embedded.
    Unsigned,
    /// A payload is present but carries no context signature.
    Unanchored,
}

/// Output of [`SignatureProtocol::verify`].
///
/// `signatures_match` and `tampered` are only meaningful when `detected`
/// is true; both are false otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub detected: bool,
    pub raw_signature: Option<String>,
    pub user_signature: String,
    pub embedded_context_signature: String,
    pub current_context_signature: String,
    pub signatures_match: bool,
    pub tampered: bool,
}

impl VerificationResult {
    pub fn verdict(&self) -> Verdict {
        if !self.detected {
            Verdict::Unsigned
        } else if self.embedded_context_signature.is_empty() {
            Verdict::Unanchored
        } else if self.tampered {
            Verdict::Tampered
        } else {
            Verdict::Authentic
        }
    }
}

/// Split a combined signature into `(user, context)`.
///
/// The first delimiter wins. Without a delimiter, a string carrying the
/// context prefix is all context; anything else yields two empty parts.
pub fn parse_combined(raw: &str) -> (&str, &str) {
    if let Some((user, context)) = raw.split_once(SIGNATURE_DELIMITER) {
        (user, context)
    } else if ContextSignature::has_prefix(raw) {
        ("", raw)
    } else {
        ("", "")
    }
}

/// Build the combined signature for a user tag and a context signature.
pub fn combine(user_signature: Option<&str>, context: &ContextSignature) -> String {
    match user_signature {
        Some(user) if !user.is_empty() => {
            format!("{}{}{}", user, SIGNATURE_DELIMITER, context)
        }
        _ => context.to_string(),
    }
}

/// Byte length of the combined signature for `user_signature`.
///
/// Known before the context signature exists, since that has a fixed length.
pub fn combined_len(user_signature: Option<&str>) -> usize {
    match user_signature {
        Some(user) if !user.is_empty() => {
            user.len() + SIGNATURE_DELIMITER.len() + CONTEXT_SIGNATURE_LEN
        }
        _ => CONTEXT_SIGNATURE_LEN,
    }
}

/// Reject user tags that would make [`parse_combined`] ambiguous.
pub fn validate_user_signature(user: &str) -> Result<()> {
    if user.contains(SIGNATURE_DELIMITER) {
        return Err(StegoSealError::InvalidUserSignature(format!(
            "must not contain '{}'",
            SIGNATURE_DELIMITER
        )));
    }
    if ContextSignature::has_prefix(user) {
        return Err(StegoSealError::InvalidUserSignature(format!(
            "must not start with '{}'",
            CONTEXT_PREFIX
        )));
    }
    Ok(())
}

/// Stateless orchestration of codec and context signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureProtocol {
    codec: BitCodec,
    context: ContextSignatureGenerator,
}

impl SignatureProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed a combined signature into a copy of `buffer`.
    ///
    /// An empty user signature is treated as absent. Fails with
    /// [`StegoSealError::Capacity`] before any hashing if the combined
    /// signature cannot fit.
    pub fn sign(&self, buffer: &PixelBuffer, user_signature: Option<&str>) -> Result<SignedImage> {
        let user_signature = user_signature.filter(|s| !s.is_empty());
        if let Some(user) = user_signature {
            validate_user_signature(user)?;
        }

        let carrier_bits = BitCodec::required_bits(combined_len(user_signature));
        let available_bits = BitCodec::capacity_bits(buffer);
        if carrier_bits > available_bits {
            return Err(StegoSealError::Capacity {
                required_bits: carrier_bits,
                available_bits,
            });
        }

        let context_signature = self.context.generate(buffer, carrier_bits)?;
        let combined_signature = combine(user_signature, &context_signature);
        debug_assert_eq!(
            BitCodec::required_bits(combined_signature.len()),
            carrier_bits
        );
        let pixels = self.codec.embed(buffer, combined_signature.as_bytes())?;

        info!(
            width = buffer.width(),
            height = buffer.height(),
            has_user_signature = user_signature.is_some(),
            context = %context_signature,
            "Signed image"
        );

        Ok(SignedImage {
            pixels,
            combined_signature,
            context_signature,
        })
    }

    /// Look for an embedded signature.
    pub fn inspect(&self, buffer: &PixelBuffer) -> DetectionResult {
        self.detect(buffer).0
    }

    /// Detection plus the number of carrier samples the payload occupies
    /// (0 when nothing was detected).
    fn detect(&self, buffer: &PixelBuffer) -> (DetectionResult, u64) {
        let payload = match self.codec.extract(buffer) {
            Extraction::Found(payload) => payload,
            Extraction::NotFound(reason) => {
                if let NotFoundReason::MalformedHeader { .. } = reason {
                    debug!(?reason, "Ignoring malformed payload header");
                }
                return (DetectionResult::not_detected(), 0);
            }
        };

        let carrier_bits = BitCodec::required_bits(payload.len());
        match String::from_utf8(payload) {
            Ok(raw) => (
                DetectionResult {
                    detected: true,
                    raw_signature: Some(raw),
                },
                carrier_bits,
            ),
            Err(e) => {
                warn!(error = %e, "Embedded payload is not UTF-8, treating as absent");
                (DetectionResult::not_detected(), 0)
            }
        }
    }

    /// Check whether `buffer` still matches the signature it carries.
    pub fn verify(&self, buffer: &PixelBuffer) -> Result<VerificationResult> {
        let (detection, carrier_bits) = self.detect(buffer);
        let current_context_signature = self
            .context
            .generate(buffer, carrier_bits)?
            .into_string();

        let Some(raw) = detection.raw_signature else {
            debug!("No embedded signature");
            return Ok(VerificationResult {
                detected: false,
                raw_signature: None,
                user_signature: String::new(),
                embedded_context_signature: String::new(),
                current_context_signature,
                signatures_match: false,
                tampered: false,
            });
        };

        let (user, embedded) = parse_combined(&raw);
        let user_signature = user.to_string();
        let embedded_context_signature = embedded.to_string();
        let signatures_match = embedded_context_signature == current_context_signature;
        let tampered = !embedded_context_signature.is_empty() && !signatures_match;

        if tampered {
            warn!(
                embedded = %embedded_context_signature,
                current = %current_context_signature,
                "Context signature mismatch"
            );
        } else {
            debug!(signatures_match, "Verified embedded signature");
        }

        Ok(VerificationResult {
            detected: true,
            raw_signature: Some(raw),
            user_signature,
            embedded_context_signature,
            current_context_signature,
            signatures_match,
            tampered,
        })
    }
}

//! LSB bit codec.
//!
//! Hides an opaque byte payload in the least significant bit of every sample
//! of a [`PixelBuffer`]. Traversal is row-major with channels in layout
//! order, identical for embedding and extraction.
//!
//! # Bitstream
//!
//! ```text
//! +-----------+----------------+------------------+
//! | magic (4) | length u32 BE  | payload (length) |
//! +-----------+----------------+------------------+
//! ```
//!
//! Each byte is written most significant bit first. The magic tag and the
//! bound check on `length` keep natural pixel noise from being read back as a
//! payload.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StegoSealError};
use crate::pixels::PixelBuffer;

/// Tag written ahead of the length field.
pub const PAYLOAD_MAGIC: [u8; 4] = *b"SSG1";

/// Header size in bytes (magic + u32 length).
pub const HEADER_BYTES: usize = 8;

/// Header size in bits.
pub const HEADER_BITS: u64 = (HEADER_BYTES * 8) as u64;

/// Why no payload could be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotFoundReason {
    /// The buffer cannot hold even a header.
    TooSmall,
    /// The carrier does not start with [`PAYLOAD_MAGIC`].
    NoMagic,
    /// The declared length runs past the end of the carrier.
    MalformedHeader { declared_bits: u64, capacity_bits: u64 },
}

/// Outcome of [`BitCodec::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(Vec<u8>),
    NotFound(NotFoundReason),
}

impl Extraction {
    /// The payload, if one was found.
    pub fn into_payload(self) -> Option<Vec<u8>> {
        match self {
            Extraction::Found(payload) => Some(payload),
            Extraction::NotFound(_) => None,
        }
    }
}

/// Stateless LSB encoder/decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitCodec;

impl BitCodec {
    pub fn new() -> Self {
        Self
    }

    /// Number of bits the buffer can carry.
    pub fn capacity_bits(buffer: &PixelBuffer) -> u64 {
        buffer.samples().len() as u64
    }

    /// Bits needed to carry a payload of `payload_len` bytes, header included.
    pub fn required_bits(payload_len: usize) -> u64 {
        HEADER_BITS + payload_len as u64 * 8
    }

    /// Largest payload, in bytes, the buffer can carry.
    pub fn max_payload_bytes(buffer: &PixelBuffer) -> usize {
        let bits = Self::capacity_bits(buffer).saturating_sub(HEADER_BITS);
        ((bits / 8).min(u32::MAX as u64)) as usize
    }

    /// Embed `payload` into a copy of `buffer`.
    ///
    /// Fails with [`StegoSealError::Capacity`] without touching anything if
    /// the payload does not fit. Only the least significant bit of the first
    /// `required_bits` samples can differ from the input.
    pub fn embed(&self, buffer: &PixelBuffer, payload: &[u8]) -> Result<PixelBuffer> {
        let required_bits = Self::required_bits(payload.len());
        let available_bits = Self::capacity_bits(buffer);

        if required_bits > available_bits || payload.len() > u32::MAX as usize {
            return Err(StegoSealError::Capacity {
                required_bits,
                available_bits,
            });
        }

        let mut header = [0u8; HEADER_BYTES];
        header[..4].copy_from_slice(&PAYLOAD_MAGIC);
        header[4..].copy_from_slice(&(payload.len() as u32).to_be_bytes());

        let mut output = buffer.clone();
        let bits = header.iter().chain(payload.iter()).flat_map(|&byte| byte_bits(byte));
        for (sample, bit) in output.samples_mut().iter_mut().zip(bits) {
            *sample = (*sample & !1) | bit;
        }

        debug!(
            payload_bytes = payload.len(),
            required_bits, available_bits, "Embedded payload"
        );

        Ok(output)
    }

    /// Read a payload back out of `buffer`.
    ///
    /// A buffer that was never embedded is an expected input and yields
    /// [`Extraction::NotFound`].
    pub fn extract(&self, buffer: &PixelBuffer) -> Extraction {
        let samples = buffer.samples();
        let capacity_bits = Self::capacity_bits(buffer);

        if capacity_bits < HEADER_BITS {
            debug!(capacity_bits, "Buffer too small for a payload header");
            return Extraction::NotFound(NotFoundReason::TooSmall);
        }

        let magic = read_bytes(&samples[..32]);
        if magic != PAYLOAD_MAGIC {
            return Extraction::NotFound(NotFoundReason::NoMagic);
        }

        let len_bytes = read_bytes(&samples[32..64]);
        let declared_len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
        let declared_bits = Self::required_bits(declared_len as usize);

        if declared_bits > capacity_bits {
            debug!(declared_bits, capacity_bits, "Declared payload length exceeds capacity");
            return Extraction::NotFound(NotFoundReason::MalformedHeader {
                declared_bits,
                capacity_bits,
            });
        }

        let start = HEADER_BITS as usize;
        let end = declared_bits as usize;
        Extraction::Found(read_bytes(&samples[start..end]))
    }
}

fn byte_bits(byte: u8) -> impl Iterator<Item = u16> {
    (0..8).rev().map(move |shift| ((byte >> shift) & 1) as u16)
}

fn read_bytes(samples: &[u16]) -> Vec<u8> {
    samples
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &s| (acc << 1) | (s & 1) as u8))
        .collect()
}

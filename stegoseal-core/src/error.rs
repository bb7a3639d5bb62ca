use thiserror::Error;

#[derive(Error, Debug)]
pub enum StegoSealError {
    #[error("Insufficient capacity: payload needs {required_bits} bits, image carries {available_bits}")]
    Capacity {
        required_bits: u64,
        available_bits: u64,
    },

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid pixel buffer: {0}")]
    InvalidPixelBuffer(String),

    #[error("Invalid user signature: {0}")]
    InvalidUserSignature(String),

    #[error("Fingerprint mismatch: {0}")]
    FingerprintMismatch(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Image encoding error: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StegoSealError>;

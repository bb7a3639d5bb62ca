//! Image identity and similarity.
//!
//! # Components
//!
//! - **Content digest**: byte-exact identity of an encoded file.
//! - **Perceptual hashing**: fingerprints that remain close for visually
//!   similar images, enabling near-duplicate detection after re-encoding.
//! - **Similarity index**: ranks a stored corpus against a candidate.

pub mod content;
pub mod perceptual;
pub mod similarity;

pub use content::*;
pub use perceptual::*;
pub use similarity::*;

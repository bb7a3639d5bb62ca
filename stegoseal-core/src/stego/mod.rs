//! Steganographic signatures.
//!
//! # Components
//!
//! - **Codec**: hides a length-prefixed payload in the carrier bit plane.
//! - **Context**: content-derived signature used as the tamper anchor.
//! - **Protocol**: sign / inspect / verify on top of the two.

pub mod codec;
pub mod context;
pub mod protocol;

pub use codec::*;
pub use context::*;
pub use protocol::*;

#![no_main]

//! Fuzz target for signature extraction and verification
//!
//! The first byte picks a width, the rest become RGB samples. Whatever sits
//! in the carrier bit plane, inspect and verify must return a result rather
//! than panic, and a detected payload must always be valid UTF-8.
//!
//! Run with: cargo +nightly fuzz run fuzz_verify

use libfuzzer_sys::fuzz_target;
use stegoseal_core::{inspect, verify, ChannelLayout, PixelBuffer};

fuzz_target!(|data: &[u8]| {
    let Some((&width, samples)) = data.split_first() else {
        return;
    };
    let width = u32::from(width.max(1));
    let pixels = samples.len() / 3;
    let height = (pixels as u32) / width;
    if height == 0 {
        return;
    }

    let used = (width * height * 3) as usize;
    let Ok(buffer) = PixelBuffer::from_u8(width, height, ChannelLayout::Rgb, &samples[..used]) else {
        return;
    };

    let detection = inspect(&buffer);
    if let Ok(result) = verify(&buffer) {
        assert_eq!(result.detected, detection.detected);
        assert!(result.current_context_signature.starts_with("CV:"));
    }
});

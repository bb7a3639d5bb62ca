#![no_main]

//! Fuzz target for FingerprintSet::from_cbor()
//!
//! Stored corpora arrive as CBOR, so arbitrary bytes must never panic the
//! decoder or produce a set that fails to re-encode.
//!
//! Run with: cargo +nightly fuzz run fuzz_from_cbor

use libfuzzer_sys::fuzz_target;
use stegoseal_core::FingerprintSet;

fuzz_target!(|data: &[u8]| {
    if let Ok(set) = FingerprintSet::from_cbor(data) {
        let encoded = set.to_cbor().expect("decoded set must re-encode");
        let again = FingerprintSet::from_cbor(&encoded).expect("re-encoded set must decode");
        assert_eq!(set, again);
    }
});

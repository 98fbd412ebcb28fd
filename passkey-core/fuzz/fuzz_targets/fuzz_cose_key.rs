#![no_main]

//! Fuzz target for CoseKey::decode() and verifier key reconstruction
//!
//! Run with: cargo +nightly fuzz run fuzz_cose_key

use libfuzzer_sys::fuzz_target;
use passkey_core::verify::{verify_assertion, PublicKey};
use passkey_core::CoseKey;

fuzz_target!(|data: &[u8]| {
    if let Ok(key) = CoseKey::decode(data) {
        if PublicKey::from_cose(&key).is_ok() {
            // Garbage signatures must be rejected, never panic
            let _ = verify_assertion(key.algorithm().id(), &key, &[0u8; 37], b"{}", data);
        }
    }
});

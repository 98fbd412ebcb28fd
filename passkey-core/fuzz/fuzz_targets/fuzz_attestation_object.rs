#![no_main]

//! Fuzz target for AttestationObject::parse()
//!
//! Any authenticator data found is handed on to the authenticator data
//! parser, as the registration ceremony does.
//!
//! Run with: cargo +nightly fuzz run fuzz_attestation_object

use libfuzzer_sys::fuzz_target;
use passkey_core::{AttestationObject, AuthenticatorData};

fuzz_target!(|data: &[u8]| {
    if let Ok(attestation) = AttestationObject::parse(data) {
        assert!(attestation.att_stmt.len() <= data.len());
        let _ = AuthenticatorData::parse(attestation.auth_data);
    }
});

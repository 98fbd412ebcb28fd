#![no_main]

//! Fuzz target for AuthenticatorData::parse()
//!
//! Run with: cargo +nightly fuzz run fuzz_authenticator_data

use libfuzzer_sys::fuzz_target;
use passkey_core::AuthenticatorData;

fuzz_target!(|data: &[u8]| {
    if let Ok(parsed) = AuthenticatorData::parse(data) {
        // A successful parse never claims more credential ID than it was given
        if let Some(attested) = parsed.attested_credential_data {
            assert!(attested.credential_id.len() < data.len());
        }
    }
});

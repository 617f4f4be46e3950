//! Fuzz target for claims parsing.
//!
//! Arbitrary bytes must parse as claims or fail cleanly, never panic.

#![no_main]

use cachet_proto::Claims;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(claims) = Claims::from_bytes(data) {
        // A successful parse must roundtrip.
        let bytes = claims.to_bytes().unwrap();
        let again = Claims::from_bytes(&bytes).unwrap();
        assert_eq!(again.message, claims.message);
        assert_eq!(again.payload_hash, claims.payload_hash);
    }
});

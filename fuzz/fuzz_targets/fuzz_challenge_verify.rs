//! Fuzz target for challenge verification.
//!
//! Arbitrary signed blobs and nonces must be rejected without panicking.

#![no_main]

use std::sync::OnceLock;

use cachet_crypto::{SignPublicKey, SignSecretKey};
use cachet_proto::wire::ChallengeResponse;
use cachet_proto::verify_solution;
use libfuzzer_sys::fuzz_target;

fn key() -> &'static SignPublicKey {
    static KEY: OnceLock<SignPublicKey> = OnceLock::new();
    KEY.get_or_init(|| SignSecretKey::generate().public_key())
}

fuzz_target!(|input: (Vec<u8>, u64)| {
    let (challenge, nonce) = input;
    let response = ChallengeResponse { challenge, nonce };

    // Unsigned garbage never verifies.
    assert!(verify_solution(&response, key()).is_err());
});

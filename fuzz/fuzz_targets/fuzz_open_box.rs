//! Fuzz target for open_box.
//!
//! Opening arbitrary bytes as a sealed box must fail cleanly, never panic.

#![no_main]

use std::sync::OnceLock;

use cachet_crypto::{open_box, BoxPublicKey, BoxSecretKey};
use libfuzzer_sys::fuzz_target;

fn keys() -> &'static (BoxPublicKey, BoxSecretKey) {
    static KEYS: OnceLock<(BoxPublicKey, BoxSecretKey)> = OnceLock::new();
    KEYS.get_or_init(|| {
        let sender = BoxSecretKey::generate();
        let sender_public = sender.public_key();
        (sender_public, BoxSecretKey::generate())
    })
}

fuzz_target!(|data: &[u8]| {
    let (sender_public, recipient) = keys();

    // Arbitrary input is not a valid sealed box for these keys; the only
    // acceptable outcome is a clean error.
    assert!(open_box(data, sender_public, recipient).is_err());
});

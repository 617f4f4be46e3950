//! Fuzz target for open_secret.
//!
//! Opening arbitrary bytes as a secret box must fail cleanly, never panic.

#![no_main]

use std::sync::OnceLock;

use cachet_crypto::{open_secret, SealKey};
use libfuzzer_sys::fuzz_target;

fn key() -> &'static SealKey {
    static KEY: OnceLock<SealKey> = OnceLock::new();
    KEY.get_or_init(SealKey::generate)
}

fuzz_target!(|data: &[u8]| {
    assert!(open_secret(data, key()).is_err());
});

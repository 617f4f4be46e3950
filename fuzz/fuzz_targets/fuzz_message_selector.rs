//! Fuzz target for message id parsing.
//!
//! Arbitrary strings must parse or fail cleanly, never panic.

#![no_main]

use cachet_server::MessageSelector;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(selector) = MessageSelector::parse(s) {
            // Whatever parses must be one of the two addressing forms.
            match selector {
                MessageSelector::Full(_) => assert_eq!(s.len(), 36),
                MessageSelector::Prefix(_) => assert_eq!(s.len(), 8),
            }
        }
    }
});

//! # cachet-crypto
//!
//! Cryptographic primitives for the cachet message relay:
//!
//! - **Keys**: fixed-width X25519 box keys, Ed25519 signing keys, and the
//!   server-local 32-byte seal key
//! - **Sealed box**: recipient-keyed authenticated encryption
//!   (X25519 + BLAKE3 KDF + XChaCha20-Poly1305)
//! - **Secret box**: symmetric authenticated encryption under the seal key
//!
//! Every ciphertext produced here carries the same framing: a single
//! version byte (currently zero), a random 24-byte nonce, then the AEAD
//! body. Fixed-size inputs fail loudly on construction; size mismatch is a
//! programmer error, not a runtime branch at each call site.
//!
//! ## Security
//!
//! Secret key material is zeroized on drop, and the box secret key does not
//! implement `Clone` to prevent accidental duplication in memory.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod keys;
pub mod sealed;

pub use error::{CryptoError, Result};
pub use keys::{
    BoxPublicKey, BoxSecretKey, SealKey, SharedSecret, SignPublicKey, SignSecretKey,
    BOX_KEY_SIZE, SEAL_KEY_SIZE, SIGNATURE_SIZE, SIGN_KEY_SIZE,
};
pub use sealed::{
    open_box, open_secret, seal_box, seal_secret, CIPHERTEXT_OVERHEAD, NONCE_SIZE, VERSION,
};

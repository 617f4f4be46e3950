//! Sealed-box and secret-box encryption.
//!
//! Both constructions share one ciphertext layout:
//!
//! ```text
//! [version (1 byte, 0x00)][nonce (24 bytes)][AEAD ciphertext + tag]
//! ```
//!
//! The sealed box is recipient-keyed: the AEAD key is derived with BLAKE3
//! from the X25519 shared secret between sender and recipient, so the
//! recipient opens it with the sender's public key and their own secret
//! key. The secret box is keyed directly by a [`SealKey`] and is used for
//! server-internal sealing of activation and bearer tokens.
//!
//! ## Security Notes
//!
//! - A fresh random 24-byte nonce per message; at 192 bits, random nonces
//!   have negligible collision probability
//! - NEVER reuse a nonce with the same key

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::keys::{BoxPublicKey, BoxSecretKey, SealKey};
use crate::{CryptoError, Result};

/// Current ciphertext version byte.
pub const VERSION: u8 = 0;

/// Size of the nonce in bytes (192 bits for XChaCha20).
pub const NONCE_SIZE: usize = 24;

/// Size of the AEAD authentication tag in bytes.
const TAG_SIZE: usize = 16;

/// Total ciphertext overhead: version byte, nonce and tag.
pub const CIPHERTEXT_OVERHEAD: usize = 1 + NONCE_SIZE + TAG_SIZE;

/// Domain separation for box key derivation.
const BOX_KEY_CONTEXT: &str = "cachet sealed box key v1";

/// Seal `plaintext` to `recipient`, authenticated as `sender`.
///
/// The recipient opens the result with [`open_box`] using the sender's
/// public key.
pub fn seal_box(
    plaintext: &[u8],
    recipient: &BoxPublicKey,
    sender: &BoxSecretKey,
) -> Result<Vec<u8>> {
    let mut key = sender.diffie_hellman(recipient).derive_key(BOX_KEY_CONTEXT);
    let sealed = seal_with_key(&key, plaintext);
    key.zeroize();
    sealed
}

/// Open a sealed box produced by [`seal_box`].
///
/// # Errors
///
/// Returns `UnsupportedVersion` if the version byte is not zero,
/// `Truncated` if the input cannot contain a nonce and tag, and
/// `Decryption` on authentication failure (tampering or wrong keys).
pub fn open_box(
    ciphertext: &[u8],
    sender: &BoxPublicKey,
    recipient: &BoxSecretKey,
) -> Result<Vec<u8>> {
    let mut key = recipient.diffie_hellman(sender).derive_key(BOX_KEY_CONTEXT);
    let opened = open_with_key(&key, ciphertext);
    key.zeroize();
    opened
}

/// Seal `plaintext` under the server-local seal key.
pub fn seal_secret(plaintext: &[u8], key: &SealKey) -> Result<Vec<u8>> {
    seal_with_key(key.as_bytes(), plaintext)
}

/// Open a secret box produced by [`seal_secret`].
pub fn open_secret(ciphertext: &[u8], key: &SealKey) -> Result<Vec<u8>> {
    open_with_key(key.as_bytes(), ciphertext)
}

fn seal_with_key(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.into());

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let body = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    let mut out = Vec::with_capacity(1 + NONCE_SIZE + body.len());
    out.push(VERSION);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&body);
    Ok(out)
}

fn open_with_key(key: &[u8; 32], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < CIPHERTEXT_OVERHEAD {
        return Err(CryptoError::Truncated);
    }

    let version = ciphertext[0];
    if version != VERSION {
        return Err(CryptoError::UnsupportedVersion { found: version });
    }

    let nonce = &ciphertext[1..1 + NONCE_SIZE];
    let body = &ciphertext[1 + NONCE_SIZE..];

    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .decrypt(XNonce::from_slice(nonce), body)
        .map_err(|_| CryptoError::Decryption)
}

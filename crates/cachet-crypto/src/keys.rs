//! Fixed-width key types.
//!
//! Peers and servers each carry two keypairs: an X25519 *box* keypair for
//! encryption and an Ed25519 *sign* keypair for challenge signing. Servers
//! additionally hold a 32-byte symmetric [`SealKey`] for sealing tokens
//! they alone need to reopen.
//!
//! ## Security Notes
//!
//! - Secret keys are zeroized on drop
//! - `BoxSecretKey` intentionally does not implement `Clone`
//! - Key generation uses `OsRng`

use ed25519_dalek::{Signer, Verifier};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of an X25519 box key (public or secret) in bytes.
pub const BOX_KEY_SIZE: usize = 32;

/// Size of an Ed25519 key (seed or public) in bytes.
pub const SIGN_KEY_SIZE: usize = 32;

/// Size of an Ed25519 detached signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Size of the server seal key in bytes.
pub const SEAL_KEY_SIZE: usize = 32;

/// X25519 public key used to address sealed boxes.
#[derive(Clone, PartialEq, Eq)]
pub struct BoxPublicKey {
    bytes: [u8; BOX_KEY_SIZE],
}

impl BoxPublicKey {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != BOX_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: BOX_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; BOX_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as bytes.
    pub fn as_bytes(&self) -> &[u8; BOX_KEY_SIZE] {
        &self.bytes
    }

    /// Convert to an owned byte array.
    pub fn to_bytes(&self) -> [u8; BOX_KEY_SIZE] {
        self.bytes
    }
}

impl std::fmt::Debug for BoxPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BoxPublicKey({:02x}{:02x}..)",
            self.bytes[0], self.bytes[1]
        )
    }
}

/// X25519 secret key.
///
/// Long-lived: one per peer endpoint, one per server. Holders derive the
/// AEAD key for a sealed box by Diffie-Hellman with the other party's
/// public key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct BoxSecretKey {
    bytes: [u8; BOX_KEY_SIZE],
}

impl BoxSecretKey {
    /// Generate a new random secret key.
    pub fn generate() -> Self {
        let secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
        Self {
            bytes: secret.to_bytes(),
        }
    }

    /// Create from raw bytes.
    ///
    /// # Security
    ///
    /// Only use bytes from a secure source (a vault, or `generate`).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != BOX_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: BOX_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; BOX_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the corresponding public key.
    pub fn public_key(&self) -> BoxPublicKey {
        let secret = x25519_dalek::StaticSecret::from(self.bytes);
        let public = x25519_dalek::PublicKey::from(&secret);
        BoxPublicKey {
            bytes: public.to_bytes(),
        }
    }

    /// Perform Diffie-Hellman with a peer public key.
    pub fn diffie_hellman(&self, peer: &BoxPublicKey) -> SharedSecret {
        let secret = x25519_dalek::StaticSecret::from(self.bytes);
        let peer = x25519_dalek::PublicKey::from(peer.to_bytes());
        SharedSecret {
            bytes: secret.diffie_hellman(&peer).to_bytes(),
        }
    }

    /// Raw bytes, for vault storage.
    ///
    /// # Security
    ///
    /// Handle with care - this exposes the secret key.
    pub fn as_bytes(&self) -> &[u8; BOX_KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for BoxSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoxSecretKey([REDACTED])")
    }
}

// Clone intentionally NOT implemented for BoxSecretKey. The endpoint's
// private key is owned by exactly one vault at a time; alternate sealings
// must derive from it rather than hold independent copies.

/// Shared secret from an X25519 exchange.
///
/// Input to a KDF, never used directly as an encryption key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: [u8; 32],
}

impl SharedSecret {
    /// Derive a 32-byte AEAD key using BLAKE3 under a context string.
    pub fn derive_key(&self, context: &str) -> [u8; 32] {
        blake3::derive_key(context, &self.bytes)
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

/// Server-local 32-byte symmetric key.
///
/// Seals activation tokens and bearer tokens that only the issuing server
/// ever reopens.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SealKey {
    bytes: [u8; SEAL_KEY_SIZE],
}

impl SealKey {
    /// Generate a new random seal key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SEAL_KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SEAL_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: SEAL_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; SEAL_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as bytes.
    pub fn as_bytes(&self) -> &[u8; SEAL_KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SealKey([REDACTED])")
    }
}

/// Ed25519 secret key used to sign hashcash challenges.
pub struct SignSecretKey {
    inner: ed25519_dalek::SigningKey,
}

impl SignSecretKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::generate(&mut OsRng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGN_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: SIGN_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; SIGN_KEY_SIZE];
        seed.copy_from_slice(bytes);
        let key = Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&seed),
        };
        seed.zeroize();
        Ok(key)
    }

    /// Get the corresponding public key.
    pub fn public_key(&self) -> SignPublicKey {
        SignPublicKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Produce a 64-byte detached signature over `message`.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.inner.sign(message).to_bytes()
    }

    /// Raw seed bytes, for operator storage.
    ///
    /// # Security
    ///
    /// Handle with care - this exposes the secret key.
    pub fn to_bytes(&self) -> [u8; SIGN_KEY_SIZE] {
        self.inner.to_bytes()
    }
}

impl std::fmt::Debug for SignSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SignSecretKey([REDACTED])")
    }
}

/// Ed25519 public key used to verify hashcash challenges.
#[derive(Clone)]
pub struct SignPublicKey {
    inner: ed25519_dalek::VerifyingKey,
}

impl SignPublicKey {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGN_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: SIGN_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; SIGN_KEY_SIZE];
        arr.copy_from_slice(bytes);
        let inner = ed25519_dalek::VerifyingKey::from_bytes(&arr)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Verify a 64-byte detached signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        if signature.len() != SIGNATURE_SIZE {
            return Err(CryptoError::SignatureVerification);
        }
        let mut sig = [0u8; SIGNATURE_SIZE];
        sig.copy_from_slice(signature);
        self.inner
            .verify(message, &ed25519_dalek::Signature::from_bytes(&sig))
            .map_err(|_| CryptoError::SignatureVerification)
    }

    /// Get the key as bytes.
    pub fn to_bytes(&self) -> [u8; SIGN_KEY_SIZE] {
        self.inner.to_bytes()
    }
}

impl std::fmt::Debug for SignPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.inner.to_bytes();
        write!(f, "SignPublicKey({:02x}{:02x}..)", bytes[0], bytes[1])
    }
}

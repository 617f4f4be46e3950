//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length.
        expected: usize,
        /// Actual key length.
        actual: usize,
    },

    /// Key bytes do not describe a valid key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Ciphertext version byte is not one we understand.
    #[error("unsupported ciphertext version {found}")]
    UnsupportedVersion {
        /// The version byte found on the ciphertext.
        found: u8,
    },

    /// Ciphertext is too short to contain the version, nonce and tag.
    #[error("ciphertext truncated")]
    Truncated,

    /// Encryption failed.
    #[error("encryption failed")]
    Encryption,

    /// Decryption failed (tampered ciphertext or wrong key).
    #[error("decryption failed: invalid ciphertext or key")]
    Decryption,

    /// Signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

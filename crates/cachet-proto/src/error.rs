//! Error types for protocol operations.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Challenge signature did not verify under the server sign key.
    #[error("invalid challenge signature")]
    InvalidChallengeSignature,

    /// Challenge timestamp is outside the acceptance window.
    #[error("challenge expired")]
    ChallengeExpired,

    /// The supplied nonce does not solve the challenge.
    #[error("invalid challenge solution")]
    InvalidChallengeSolution,

    /// Challenge difficulty is outside the representable range, or the
    /// nonce space was exhausted without a solution.
    #[error("invalid challenge complexity {0}")]
    InvalidComplexity(u32),

    /// Challenge body failed structural validation.
    #[error("invalid challenge: {0}")]
    InvalidChallenge(String),

    /// Request body exceeds the envelope size limit.
    #[error("secret too big: {actual} bytes exceeds the {limit} byte limit")]
    SecretTooBig {
        /// Serialized envelope size.
        actual: usize,
        /// The enforced limit.
        limit: usize,
    },

    /// Wire body could not be serialized or parsed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Cryptographic error.
    #[error(transparent)]
    Crypto(#[from] cachet_crypto::CryptoError),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

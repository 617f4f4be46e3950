//! Server error taxonomy and the wire status mapping.

use cachet_proto::ProtocolError;
use thiserror::Error;

/// Errors produced by the server engine.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Request authentication failed (missing, malformed, expired or
    /// unresolvable bearer token).
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated but not permitted (wrong activation code).
    #[error("forbidden")]
    Forbidden,

    /// Activation token could not be decoded or opened.
    #[error("invalid token")]
    InvalidToken,

    /// Alias already bound to a different public key.
    #[error("peer already enrolled")]
    ExistingPeer,

    /// No peer row for the alias.
    #[error("unknown peer {0}")]
    UnknownPeer(String),

    /// No message matches the id.
    #[error("unknown message id")]
    UnknownMessageId,

    /// More than one message matches an 8-hex prefix.
    #[error("ambiguous message id")]
    AmbiguousMessageId,

    /// No server is registered for the hostname.
    #[error("unknown server {0}")]
    UnknownServer(String),

    /// Structurally invalid request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Storage layer failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Activation delivery or other internal failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// Protocol-layer failure (challenge verification, size limits,
    /// serialization).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Cryptographic failure not attributable to the request.
    #[error(transparent)]
    Crypto(#[from] cachet_crypto::CryptoError),
}

impl ServerError {
    /// The HTTP status this error maps to.
    ///
    /// This is the only place that knows the mapping; handlers never
    /// downgrade an error to pick a different status.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::Unauthorized => 401,
            ServerError::Forbidden => 403,
            ServerError::InvalidToken => 400,
            ServerError::ExistingPeer => 409,
            ServerError::UnknownPeer(_) => 404,
            ServerError::UnknownMessageId => 404,
            ServerError::AmbiguousMessageId => 409,
            ServerError::UnknownServer(_) => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Storage(_) | ServerError::Internal(_) | ServerError::Crypto(_) => 500,
            ServerError::Protocol(p) => match p {
                ProtocolError::SecretTooBig { .. } => 400,
                ProtocolError::Serialization(_) => 400,
                ProtocolError::InvalidChallenge(_) => 400,
                ProtocolError::InvalidChallengeSignature
                | ProtocolError::ChallengeExpired
                | ProtocolError::InvalidChallengeSolution
                | ProtocolError::InvalidComplexity(_) => 403,
                ProtocolError::Crypto(_) => 500,
            },
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

//! Error types for client operations.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Peer is not in the directory and the accept-peers policy is off.
    #[error("unknown peer {0}; run `peer add {0}` to trust it")]
    UnknownPeer(String),

    /// Claims did not survive verification: the claimed key disagrees
    /// with the directory, or a content hash disagrees with what was
    /// received.
    #[error("message claim does not match")]
    ClaimMismatch,

    /// The alias is already enrolled at this endpoint, or the server
    /// holds a different key for it.
    #[error("already enrolled: {0}")]
    Conflict(String),

    /// The endpoint has no bearer token yet.
    #[error("endpoint is not activated; run activate with your token and code")]
    NotActivated,

    /// The endpoint has no server key yet.
    #[error("endpoint is not enrolled")]
    NotEnrolled,

    /// Alias is not an email-shaped identifier.
    #[error("invalid alias: {0}")]
    InvalidAlias(String),

    /// A vault refused the operation.
    #[error("vault error: {0}")]
    Vault(String),

    /// Read attempted against a sealed vault.
    #[error("vault is sealed")]
    VaultSealed,

    /// Configuration could not be loaded or saved.
    #[error("config error: {0}")]
    Config(String),

    /// Some recipients of a fan-out send failed.
    #[error("send failed for {} recipient(s): {}", failures.len(), failures.join("; "))]
    SendFailed {
        /// One rendered failure per recipient, in send order.
        failures: Vec<String>,
    },

    /// A transport operation failed; the context names the operation.
    #[error("{context}: {source}")]
    Transport {
        /// What the client was doing (which alias, which message id).
        context: String,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// Wire body could not be serialized or parsed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Cryptographic error.
    #[error(transparent)]
    Crypto(#[from] cachet_crypto::CryptoError),

    /// Protocol error (size limits, challenge engine).
    #[error(transparent)]
    Protocol(#[from] cachet_proto::ProtocolError),
}

impl ClientError {
    /// Wrap a transport failure with its operation context.
    pub(crate) fn transport(context: impl Into<String>) -> impl FnOnce(TransportError) -> Self {
        let context = context.into();
        move |source| ClientError::Transport { context, source }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

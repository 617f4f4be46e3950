//! Storage contract for peers and messages.
//!
//! The engine talks to durable state only through [`Storage`], so any
//! relational or KV store can sit behind it. The trait is synchronous and
//! implementations are expected to share internal state across clones
//! (typically via `Arc`). Standard isolation is assumed; the engine does
//! no cross-request coordination of its own.

mod memory;

pub use memory::MemoryStorage;

use uuid::Uuid;

use cachet_proto::limits::{MESSAGE_ID_FULL_LEN, MESSAGE_ID_PREFIX_LEN};

use crate::{Result, ServerError};

/// A peer enrolled with a server.
///
/// Created only on successful activation and immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerRecord {
    /// Owning server.
    pub server: Uuid,
    /// Opaque peer id.
    pub peer: Uuid,
    /// Alias, unique per server.
    pub alias: String,
    /// Public box key (32 bytes).
    pub public_key: Vec<u8>,
}

/// A stored message awaiting fetch or expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredMessage {
    /// Owning server.
    pub server: Uuid,
    /// Recipient peer id.
    pub recipient: Uuid,
    /// Message id (UUIDv4, so 8-hex prefixes are well distributed).
    pub id: Uuid,
    /// Sender peer id.
    pub sender: Uuid,
    /// Sender alias at send time.
    pub sender_alias: String,
    /// Unix timestamp of receipt.
    pub received: i64,
    /// Sealed metadata ciphertext.
    pub metadata: Vec<u8>,
    /// Sealed payload ciphertext.
    pub payload: Vec<u8>,
    /// Claims sealed to the recipient.
    pub claims: Vec<u8>,
}

/// How a message is being looked up: by full UUID or by the first eight
/// hex characters of its id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageSelector {
    /// Exact 36-character UUID.
    Full(Uuid),
    /// 8-hex-digit prefix, i.e. the top 32 bits of the id.
    Prefix(u32),
}

impl MessageSelector {
    /// Parse a message id argument.
    ///
    /// Anything that is neither 8 nor 36 characters is a bad request; a
    /// malformed UUID at full length is treated as an unknown id (it can
    /// match nothing).
    pub fn parse(id: &str) -> Result<Self> {
        match id.len() {
            MESSAGE_ID_PREFIX_LEN => {
                let prefix = u32::from_str_radix(id, 16)
                    .map_err(|_| ServerError::BadRequest(format!("invalid message id {id}")))?;
                Ok(MessageSelector::Prefix(prefix))
            }
            MESSAGE_ID_FULL_LEN => {
                let id = Uuid::parse_str(id).map_err(|_| ServerError::UnknownMessageId)?;
                Ok(MessageSelector::Full(id))
            }
            _ => Err(ServerError::BadRequest(format!(
                "invalid message id {id}"
            ))),
        }
    }

    /// Whether a message id falls under this selector.
    pub fn matches(&self, id: Uuid) -> bool {
        match self {
            MessageSelector::Full(full) => *full == id,
            // The prefix selects the range [prefix << 96, (prefix+1) << 96)
            // of the id space; comparing the top 32 bits is the same scan.
            MessageSelector::Prefix(prefix) => (id.as_u128() >> 96) as u32 == *prefix,
        }
    }
}

/// Errors surfaced by storage implementations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No message matched the selector.
    #[error("unknown message id")]
    UnknownMessageId,

    /// More than one message matched a prefix selector.
    #[error("ambiguous message id")]
    AmbiguousMessageId,

    /// Alias already has a peer row.
    #[error("peer already exists")]
    ExistingPeer,

    /// Backend failure.
    #[error("storage backend: {0}")]
    Backend(String),
}

impl From<StorageError> for ServerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnknownMessageId => ServerError::UnknownMessageId,
            StorageError::AmbiguousMessageId => ServerError::AmbiguousMessageId,
            StorageError::ExistingPeer => ServerError::ExistingPeer,
            StorageError::Backend(msg) => ServerError::Storage(msg),
        }
    }
}

/// Storage contract the engine requires.
///
/// Both lookup paths fail closed: a prefix matching more than one row is
/// an error, never a silent pick.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Create a peer row. Fails with [`StorageError::ExistingPeer`] if the
    /// alias already has one.
    fn create_peer(&self, peer: &PeerRecord) -> std::result::Result<(), StorageError>;

    /// Look up a peer by alias.
    fn peer_by_alias(
        &self,
        server: Uuid,
        alias: &str,
    ) -> std::result::Result<Option<PeerRecord>, StorageError>;

    /// Persist a message.
    fn insert_message(&self, message: &StoredMessage) -> std::result::Result<(), StorageError>;

    /// Fetch one of the recipient's messages by selector.
    fn message_by_selector(
        &self,
        server: Uuid,
        recipient: Uuid,
        selector: MessageSelector,
    ) -> std::result::Result<StoredMessage, StorageError>;

    /// All messages for a recipient, ordered by `(received, id)` ascending.
    fn inbox(
        &self,
        server: Uuid,
        recipient: Uuid,
    ) -> std::result::Result<Vec<StoredMessage>, StorageError>;

    /// Delete a message by exact id.
    fn delete_message(&self, server: Uuid, id: Uuid) -> std::result::Result<(), StorageError>;
}

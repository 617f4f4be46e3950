//! In-memory storage.
//!
//! Backs tests and single-node deployments. Clones share state through an
//! `Arc`; a poisoned lock is surfaced as a backend error rather than a
//! panic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use super::{MessageSelector, PeerRecord, Storage, StorageError, StoredMessage};

#[derive(Default)]
struct Inner {
    /// Keyed by (server, alias).
    peers: HashMap<(Uuid, String), PeerRecord>,
    messages: Vec<StoredMessage>,
}

/// Shared in-memory implementation of [`Storage`].
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Backend("storage lock poisoned".into()))
    }
}

impl Storage for MemoryStorage {
    fn create_peer(&self, peer: &PeerRecord) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let key = (peer.server, peer.alias.clone());
        if inner.peers.contains_key(&key) {
            return Err(StorageError::ExistingPeer);
        }
        inner.peers.insert(key, peer.clone());
        Ok(())
    }

    fn peer_by_alias(
        &self,
        server: Uuid,
        alias: &str,
    ) -> Result<Option<PeerRecord>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.peers.get(&(server, alias.to_string())).cloned())
    }

    fn insert_message(&self, message: &StoredMessage) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.messages.push(message.clone());
        Ok(())
    }

    fn message_by_selector(
        &self,
        server: Uuid,
        recipient: Uuid,
        selector: MessageSelector,
    ) -> Result<StoredMessage, StorageError> {
        let inner = self.lock()?;
        let mut matches = inner.messages.iter().filter(|m| {
            m.server == server && m.recipient == recipient && selector.matches(m.id)
        });

        let first = matches.next().ok_or(StorageError::UnknownMessageId)?;
        if matches.next().is_some() {
            return Err(StorageError::AmbiguousMessageId);
        }
        Ok(first.clone())
    }

    fn inbox(&self, server: Uuid, recipient: Uuid) -> Result<Vec<StoredMessage>, StorageError> {
        let inner = self.lock()?;
        let mut messages: Vec<StoredMessage> = inner
            .messages
            .iter()
            .filter(|m| m.server == server && m.recipient == recipient)
            .cloned()
            .collect();
        // Receipt order; same-instant ties resolve by message id.
        messages.sort_by_key(|m| (m.received, m.id));
        Ok(messages)
    }

    fn delete_message(&self, server: Uuid, id: Uuid) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let before = inner.messages.len();
        inner.messages.retain(|m| !(m.server == server && m.id == id));
        if inner.messages.len() == before {
            return Err(StorageError::UnknownMessageId);
        }
        Ok(())
    }
}

//! Message handlers: send, inbox, get, delete, invite.

use uuid::Uuid;

use cachet_crypto::{seal_box, BoxPublicKey};
use cachet_proto::wire::{Envelope, Inbox, InboxMessage, MessageResponse, SendResponse};
use cachet_proto::Claims;

use crate::storage::{MessageSelector, PeerRecord, Storage, StoredMessage};
use crate::{Result, ServerEngine, ServerError};

impl<S: Storage> ServerEngine<S> {
    /// Handle `POST /message/{recipient}`.
    ///
    /// Persists the sealed envelope together with claims the server seals
    /// to the recipient: the sender's alias and key as witnessed here, and
    /// SHA-256 hashes of both stored ciphertexts.
    pub fn send(
        &self,
        sender: &PeerRecord,
        recipient_alias: &str,
        envelope: &Envelope,
    ) -> Result<SendResponse> {
        envelope.check_size()?;

        let recipient = self.require_peer(recipient_alias)?;
        let recipient_key = BoxPublicKey::from_bytes(&recipient.public_key)
            .map_err(|_| ServerError::Internal("stored peer key is malformed".into()))?;

        let id = Uuid::new_v4();
        let received = chrono::Utc::now().timestamp();

        let claims = Claims::over(
            id,
            sender.alias.clone(),
            sender.public_key.clone(),
            &envelope.payload,
            &envelope.metadata,
            received,
        );
        let sealed_claims = seal_box(&claims.to_bytes()?, &recipient_key, self.keys().box_secret())?;

        self.storage().insert_message(&StoredMessage {
            server: self.keys().server_id(),
            recipient: recipient.peer,
            id,
            sender: sender.peer,
            sender_alias: sender.alias.clone(),
            received,
            metadata: envelope.metadata.clone(),
            payload: envelope.payload.clone(),
            claims: sealed_claims,
        })?;

        tracing::info!(
            message = %id,
            sender = %sender.alias,
            recipient = %recipient.alias,
            "message stored"
        );

        Ok(SendResponse { id })
    }

    /// Handle `GET /inbox`.
    ///
    /// `None` means an empty inbox; the transport renders it as 204.
    pub fn inbox(&self, peer: &PeerRecord) -> Result<Option<Inbox>> {
        let messages = self.storage().inbox(self.keys().server_id(), peer.peer)?;
        if messages.is_empty() {
            return Ok(None);
        }

        Ok(Some(Inbox {
            messages: messages
                .into_iter()
                .map(|m| InboxMessage {
                    id: m.id,
                    sender: m.sender_alias,
                    timestamp: m.received,
                    size: m.payload.len(),
                    metadata: m.metadata,
                })
                .collect(),
        }))
    }

    /// Handle `GET /message/{id}`.
    ///
    /// `id` is the full UUID or its first eight hex characters; a prefix
    /// matching more than one message is an error, never a silent pick.
    pub fn message(&self, peer: &PeerRecord, id: &str) -> Result<MessageResponse> {
        let selector = MessageSelector::parse(id)?;
        let stored =
            self.storage()
                .message_by_selector(self.keys().server_id(), peer.peer, selector)?;

        Ok(MessageResponse {
            id: stored.id,
            sender: stored.sender_alias,
            timestamp: stored.received,
            metadata: stored.metadata,
            payload: stored.payload,
            claims: stored.claims,
        })
    }

    /// Handle `DELETE /message/{id}`.
    pub fn delete(&self, peer: &PeerRecord, id: &str) -> Result<()> {
        let selector = MessageSelector::parse(id)?;
        let stored =
            self.storage()
                .message_by_selector(self.keys().server_id(), peer.peer, selector)?;
        self.storage()
            .delete_message(self.keys().server_id(), stored.id)?;

        tracing::info!(message = %stored.id, peer = %peer.alias, "message deleted");
        Ok(())
    }

    /// Handle `POST /invite/{alias}`.
    ///
    /// A stub by contract: log and succeed.
    pub fn invite(&self, peer: &PeerRecord, alias: &str) -> Result<()> {
        tracing::info!(from = %peer.alias, to = %alias, "invite requested");
        Ok(())
    }
}

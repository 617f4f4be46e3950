//! Endpoint operations against a transport.
//!
//! These are the semantic client operations - enrol, activate, send, list,
//! fetch, delete, invite, peer management - with all protocol logic here
//! and all I/O behind the [`Transport`] seam. Transport failures are
//! rewrapped with the operation context (which alias, which message id)
//! for user display.

use uuid::Uuid;

use cachet_crypto::BoxPublicKey;
use cachet_proto::wire::{ActivationRequest, EnrolRequest, Envelope, Metadata};
use cachet_proto::{solve_challenge, Claims};

use crate::endpoint::{validate_alias, Endpoint, Peer};
use crate::transport::Transport;
use crate::vault::VAULT_KEY_TOKEN;
use crate::{ClientError, Result};

/// Outcome of one recipient in a fan-out send.
#[derive(Clone, Debug)]
pub struct SendReceipt {
    /// Recipient alias.
    pub recipient: String,
    /// Server-assigned message id.
    pub id: Uuid,
}

/// One decrypted inbox listing entry.
#[derive(Clone, Debug)]
pub struct InboxEntry {
    /// Message id.
    pub id: Uuid,
    /// Sender alias as attested by the server.
    pub sender: String,
    /// Unix timestamp of receipt.
    pub timestamp: i64,
    /// Encrypted size hint.
    pub size: usize,
    /// Decrypted metadata; `None` when the sender could not be resolved
    /// or the metadata failed to open. Listing does not verify claims -
    /// fetching does.
    pub metadata: Option<Metadata>,
}

/// A fetched and fully verified message.
#[derive(Clone, Debug)]
pub struct FetchedMessage {
    /// Message id.
    pub id: Uuid,
    /// Sender alias, verified against the claims and the peer directory.
    pub sender: String,
    /// Decrypted metadata.
    pub metadata: Metadata,
    /// Decrypted payload.
    pub payload: Vec<u8>,
}

impl Endpoint {
    /// Enrol this endpoint's alias and public key with the server.
    ///
    /// Fetches a challenge, solves it, and posts the candidate key. On a
    /// first enrolment the server responds `activated: false` and sends
    /// the activation token out-of-band; re-enrolment with the same key
    /// is a no-op with `activated: true`. Records the server's public
    /// key either way.
    pub fn enrol<T: Transport>(&mut self, transport: &T) -> Result<bool> {
        let request = transport
            .get_challenge()
            .map_err(ClientError::transport(format!(
                "unable to get challenge from {}",
                self.url
            )))?;

        let solution = solve_challenge(&request)?;

        let body = EnrolRequest {
            public_key: self.public_key.clone(),
        };

        let response = transport
            .enrol(&self.alias, &solution, &body)
            .map_err(|e| match e.status() {
                Some(409) => ClientError::Conflict(format!(
                    "{} is enrolled at {} with a different key",
                    self.alias, self.url
                )),
                _ => ClientError::transport(format!("unable to enrol {}", self.alias))(e),
            })?;

        // Fail loudly before trusting a malformed server key.
        BoxPublicKey::from_bytes(&response.server_key)?;
        self.server_key = response.server_key.clone();

        tracing::debug!(alias = %self.alias, activated = response.activated, "enrolled");
        Ok(response.activated)
    }

    /// Complete activation with the out-of-band token and code.
    ///
    /// Stores the returned bearer token in the vault.
    pub fn activate<T: Transport>(&mut self, transport: &T, token: &str, code: u32) -> Result<()> {
        let response = transport
            .activate(&ActivationRequest {
                token: token.to_string(),
                code,
            })
            .map_err(ClientError::transport(format!(
                "unable to activate {}",
                self.alias
            )))?;

        self.vault_set(VAULT_KEY_TOKEN, response.token.as_bytes())?;
        tracing::debug!(alias = %self.alias, "activated");
        Ok(())
    }

    /// Resolve a peer, honoring the accept-peers policy on first contact.
    pub fn resolve_peer<T: Transport>(
        &mut self,
        transport: &T,
        accept_peers: bool,
        alias: &str,
    ) -> Result<Peer> {
        if let Some(peer) = self.known_peer(alias) {
            return Ok(peer.clone());
        }

        if !accept_peers {
            return Err(ClientError::UnknownPeer(alias.to_string()));
        }

        self.add_peer(transport, alias)
    }

    /// Fetch a peer's key from the server and add it to the directory.
    pub fn add_peer<T: Transport>(&mut self, transport: &T, alias: &str) -> Result<Peer> {
        validate_alias(alias)?;
        let token = self.bearer_token()?;

        let info = transport
            .get_peer(&token, alias)
            .map_err(ClientError::transport(format!(
                "unable to get peer {alias}"
            )))?;

        if info.peer != alias {
            return Err(ClientError::Serialization(format!(
                "server returned peer {} for {alias}",
                info.peer
            )));
        }
        BoxPublicKey::from_bytes(&info.public_key)?;

        let peer = Peer {
            alias: alias.to_string(),
            public_key: info.public_key,
        };
        tracing::info!(alias, "adding new peer");
        self.insert_peer(peer.clone());
        Ok(peer)
    }

    /// Send a payload to one or more recipients.
    ///
    /// The payload and its metadata are sealed separately per recipient
    /// (fresh nonces each) and posted one message per recipient. The size
    /// cap is enforced locally before any network call. A failure for one
    /// recipient does not abort the others; if any fail, the collected
    /// failures surface as one [`ClientError::SendFailed`] after every
    /// recipient has been attempted.
    pub fn send<T: Transport>(
        &mut self,
        transport: &T,
        accept_peers: bool,
        recipients: &[String],
        payload: &[u8],
        description: &str,
        filename: &str,
    ) -> Result<Vec<SendReceipt>> {
        if recipients.is_empty() {
            return Err(ClientError::InvalidAlias("no recipients".into()));
        }

        let metadata = Metadata {
            description: description.to_string(),
            size: payload.len(),
            filename: filename.to_string(),
        };
        let metadata_clear = serde_json::to_vec(&metadata)
            .map_err(|e| ClientError::Serialization(e.to_string()))?;

        // First pass: resolve every peer and seal every envelope, so a
        // typo or an oversize payload fails before anything is sent.
        let mut prepared = Vec::with_capacity(recipients.len());
        for alias in recipients {
            let peer = self.resolve_peer(transport, accept_peers, alias)?;
            let peer_key = BoxPublicKey::from_bytes(&peer.public_key)?;

            let envelope = Envelope {
                payload: self.seal_to(&peer_key, payload)?,
                metadata: self.seal_to(&peer_key, &metadata_clear)?,
            };
            envelope.check_size()?;
            prepared.push((alias.clone(), envelope));
        }

        let token = self.bearer_token()?;

        // Second pass: actually send, collecting per-recipient failures.
        let mut receipts = Vec::with_capacity(prepared.len());
        let mut failures = Vec::new();
        for (alias, envelope) in prepared {
            match transport.post_message(&token, &alias, &envelope) {
                Ok(response) => receipts.push(SendReceipt {
                    recipient: alias,
                    id: response.id,
                }),
                Err(e) => failures.push(format!("{alias}: {e}")),
            }
        }

        if !failures.is_empty() {
            return Err(ClientError::SendFailed { failures });
        }
        Ok(receipts)
    }

    /// List the inbox, decrypting metadata where the sender resolves.
    ///
    /// Listing is a preview: it does not verify claims, and entries whose
    /// sender is unknown under the policy simply carry no metadata.
    /// [`Endpoint::fetch`] is the verified path.
    pub fn list<T: Transport>(
        &mut self,
        transport: &T,
        accept_peers: bool,
    ) -> Result<Vec<InboxEntry>> {
        let token = self.bearer_token()?;

        let inbox = transport
            .get_inbox(&token)
            .map_err(ClientError::transport("unable to get inbox"))?;

        let Some(inbox) = inbox else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::with_capacity(inbox.messages.len());
        for message in inbox.messages {
            let metadata = self
                .open_metadata(transport, accept_peers, &message.sender, &message.metadata)
                .map_err(|e| {
                    tracing::warn!(message = %message.id, "unable to open metadata: {e}");
                    e
                })
                .ok();

            entries.push(InboxEntry {
                id: message.id,
                sender: message.sender,
                timestamp: message.timestamp,
                size: message.size,
                metadata,
            });
        }
        Ok(entries)
    }

    fn open_metadata<T: Transport>(
        &mut self,
        transport: &T,
        accept_peers: bool,
        sender: &str,
        ciphertext: &[u8],
    ) -> Result<Metadata> {
        let peer = self.resolve_peer(transport, accept_peers, sender)?;
        let sender_key = BoxPublicKey::from_bytes(&peer.public_key)?;
        let clear = self.open_from(&sender_key, ciphertext)?;
        serde_json::from_slice(&clear).map_err(|e| ClientError::Serialization(e.to_string()))
    }

    /// Fetch a message by full or 8-hex-prefix id and verify it.
    ///
    /// Verification order: open the claims with the server's key, resolve
    /// the claimed sender through the policy-gated directory, require the
    /// directory key to equal the claimed key, require both content
    /// hashes to match the received ciphertexts - all before any
    /// decryption is attempted.
    pub fn fetch<T: Transport>(
        &mut self,
        transport: &T,
        accept_peers: bool,
        id: &str,
    ) -> Result<FetchedMessage> {
        let token = self.bearer_token()?;

        let message = transport
            .get_message(&token, id)
            .map_err(ClientError::transport(format!(
                "unable to get message {id}"
            )))?;

        let server_key = self.server_public()?;
        let claims_clear = self.open_from(&server_key, &message.claims)?;
        let claims = Claims::from_bytes(&claims_clear)?;

        // The claimed key must match the directory's commitment for the
        // alias; trusting the claims alone would let the server swap keys.
        let peer = self.resolve_peer(transport, accept_peers, &claims.alias)?;
        if peer.public_key != claims.public_key {
            return Err(ClientError::ClaimMismatch);
        }

        if claims.message != message.id {
            return Err(ClientError::ClaimMismatch);
        }

        if !claims.content_matches(&message.payload, &message.metadata) {
            return Err(ClientError::ClaimMismatch);
        }

        let sender_key = BoxPublicKey::from_bytes(&claims.public_key)?;
        let payload = self.open_from(&sender_key, &message.payload)?;
        let metadata_clear = self.open_from(&sender_key, &message.metadata)?;
        let metadata = serde_json::from_slice(&metadata_clear)
            .map_err(|e| ClientError::Serialization(e.to_string()))?;

        Ok(FetchedMessage {
            id: message.id,
            sender: claims.alias,
            metadata,
            payload,
        })
    }

    /// Delete a message by full or 8-hex-prefix id.
    pub fn delete<T: Transport>(&mut self, transport: &T, id: &str) -> Result<()> {
        let token = self.bearer_token()?;
        transport
            .delete_message(&token, id)
            .map_err(ClientError::transport(format!(
                "unable to delete message {id}"
            )))
    }

    /// Ask the server to invite a peer.
    pub fn invite<T: Transport>(&mut self, transport: &T, alias: &str) -> Result<()> {
        validate_alias(alias)?;
        let token = self.bearer_token()?;
        transport
            .invite(&token, alias)
            .map_err(ClientError::transport(format!(
                "unable to invite {alias}"
            )))
    }
}

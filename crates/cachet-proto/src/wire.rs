//! Wire bodies for the relay HTTP API.
//!
//! Everything here is JSON on the wire. Byte fields are base64 strings
//! (see [`crate::b64`]). The transport carries these bodies; it does not
//! interpret them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::limits::MESSAGE_SIZE_LIMIT;
use crate::{b64, ProtocolError, Result};

/// Response to `GET /challenge`: the server-signed hashcash blob.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeRequest {
    /// Detached signature (64 bytes) prepended to the canonical challenge
    /// JSON. Returned to the server unchanged.
    #[serde(with = "b64")]
    pub challenge: Vec<u8>,
}

/// A solved challenge, presented with the enrolment request.
///
/// On the wire this travels as the `Challenge` (base64) and `Nonce`
/// (decimal) headers of `POST /enrol/{alias}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// The signed blob, byte-for-byte as issued.
    #[serde(with = "b64")]
    pub challenge: Vec<u8>,
    /// The nonce that solves it.
    pub nonce: u64,
}

/// Body of `POST /enrol/{alias}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolRequest {
    /// Candidate public box key for the alias.
    #[serde(with = "b64")]
    pub public_key: Vec<u8>,
}

/// Response to `POST /enrol/{alias}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolResponse {
    /// The server's public box key.
    #[serde(with = "b64")]
    pub server_key: Vec<u8>,
    /// True when the alias was already bound to this key (idempotent
    /// re-enrolment); false when an activation token was dispatched.
    pub activated: bool,
    /// Human-readable status line.
    pub message: String,
}

/// Body of `POST /activate`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivationRequest {
    /// The base64url activation token conveyed out-of-band.
    pub token: String,
    /// The numeric code conveyed alongside it.
    pub code: u32,
}

/// Response to `POST /activate`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivationResponse {
    /// Bearer token (base64) to present on every subsequent request.
    pub token: String,
    /// Human-readable welcome line.
    pub message: String,
}

/// Response to `GET /peer/{alias}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    /// The alias queried.
    pub peer: String,
    /// The public box key the server holds for it.
    #[serde(with = "b64")]
    pub public_key: Vec<u8>,
}

/// Decrypted message metadata.
///
/// Travels only in sealed form; this is the plaintext the recipient
/// recovers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Free-form description supplied by the sender.
    pub description: String,
    /// Plaintext payload size in bytes.
    pub size: usize,
    /// Original filename, empty when the payload came from a stream.
    pub filename: String,
}

/// Body of `POST /message/{recipient}`: separately sealed metadata and
/// payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    /// Sealed payload ciphertext.
    #[serde(with = "b64")]
    pub payload: Vec<u8>,
    /// Sealed metadata ciphertext.
    #[serde(with = "b64")]
    pub metadata: Vec<u8>,
}

impl Envelope {
    /// Serialized size of this envelope as a request body.
    pub fn encoded_len(&self) -> usize {
        // Serialization of two byte fields cannot fail.
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }

    /// Enforce the request-body size cap.
    ///
    /// The same check runs on the client (before any network call) and on
    /// the server (before persisting).
    pub fn check_size(&self) -> Result<()> {
        let actual = self.encoded_len();
        if actual > MESSAGE_SIZE_LIMIT {
            return Err(ProtocolError::SecretTooBig {
                actual,
                limit: MESSAGE_SIZE_LIMIT,
            });
        }
        Ok(())
    }
}

/// Response to `POST /message/{recipient}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SendResponse {
    /// Server-assigned message id.
    pub id: Uuid,
}

/// Response to `GET /inbox`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Inbox {
    /// Messages for the authenticated peer, ordered by receipt time.
    pub messages: Vec<InboxMessage>,
}

/// One inbox listing entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InboxMessage {
    /// Message id.
    pub id: Uuid,
    /// Sender alias, as attested by the server.
    pub sender: String,
    /// Unix timestamp of receipt.
    pub timestamp: i64,
    /// Encrypted payload size; a hint for display only.
    pub size: usize,
    /// Sealed metadata ciphertext.
    #[serde(with = "b64")]
    pub metadata: Vec<u8>,
}

/// Response to `GET /message/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message id.
    pub id: Uuid,
    /// Sender alias, as attested by the server.
    pub sender: String,
    /// Unix timestamp of receipt.
    pub timestamp: i64,
    /// Sealed metadata ciphertext.
    #[serde(with = "b64")]
    pub metadata: Vec<u8>,
    /// Sealed payload ciphertext.
    #[serde(with = "b64")]
    pub payload: Vec<u8>,
    /// Claims sealed to the recipient by the server.
    #[serde(with = "b64")]
    pub claims: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_size_accounting() {
        let envelope = Envelope {
            payload: vec![1; 100],
            metadata: vec![2; 50],
        };
        assert_eq!(
            envelope.encoded_len(),
            serde_json::to_vec(&envelope).unwrap().len()
        );
        envelope.check_size().unwrap();
    }

    #[test]
    fn envelope_over_limit_rejected() {
        let envelope = Envelope {
            payload: vec![0xAA; MESSAGE_SIZE_LIMIT],
            metadata: vec![],
        };
        assert!(matches!(
            envelope.check_size(),
            Err(ProtocolError::SecretTooBig { .. })
        ));
    }

    #[test]
    fn enrol_request_wire_shape() {
        let req = EnrolRequest {
            public_key: vec![0; 4],
        };
        let js = serde_json::to_string(&req).unwrap();
        assert_eq!(js, r#"{"publicKey":"AAAAAA=="}"#);
    }

    #[test]
    fn inbox_roundtrip() {
        let inbox = Inbox {
            messages: vec![InboxMessage {
                id: Uuid::new_v4(),
                sender: "a@example.com".into(),
                timestamp: 1_700_000_000,
                size: 58,
                metadata: vec![9, 8, 7],
            }],
        };
        let js = serde_json::to_vec(&inbox).unwrap();
        let back: Inbox = serde_json::from_slice(&js).unwrap();
        assert_eq!(back.messages.len(), 1);
        assert_eq!(back.messages[0].id, inbox.messages[0].id);
        assert_eq!(back.messages[0].metadata, vec![9, 8, 7]);
    }
}

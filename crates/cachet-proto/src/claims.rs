//! Server-issued message claims.
//!
//! When the server accepts a send it constructs a claims document binding
//! the message id, the sender's alias and public key as the server saw
//! them, and SHA-256 hashes of both stored ciphertexts. The document is
//! sealed to the recipient with the server's box key, so only the
//! recipient can open it, and only the server could have produced it
//! (provided the server's public key is known).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{b64, ProtocolError, Result};

/// The claims plaintext, JSON-marshalled before sealing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Message id this claim is bound to.
    pub message: Uuid,
    /// Sender alias at send time.
    pub alias: String,
    /// Sender public box key at send time.
    #[serde(with = "b64")]
    pub public_key: Vec<u8>,
    /// SHA-256 of the stored payload ciphertext.
    #[serde(with = "b64")]
    pub payload_hash: Vec<u8>,
    /// SHA-256 of the stored metadata ciphertext.
    #[serde(with = "b64")]
    pub metadata_hash: Vec<u8>,
    /// Unix timestamp at send.
    pub timestamp: i64,
}

impl Claims {
    /// Build claims over the two ciphertexts of a message.
    pub fn over(
        message: Uuid,
        alias: impl Into<String>,
        public_key: Vec<u8>,
        payload_ciphertext: &[u8],
        metadata_ciphertext: &[u8],
        timestamp: i64,
    ) -> Self {
        Self {
            message,
            alias: alias.into(),
            public_key,
            payload_hash: Sha256::digest(payload_ciphertext).to_vec(),
            metadata_hash: Sha256::digest(metadata_ciphertext).to_vec(),
            timestamp,
        }
    }

    /// Check the embedded hashes against actually-received ciphertexts.
    ///
    /// Recipients run this *before* attempting decryption: a mismatch
    /// means the stored message no longer matches what the server attested
    /// at send time.
    pub fn content_matches(&self, payload_ciphertext: &[u8], metadata_ciphertext: &[u8]) -> bool {
        self.payload_hash.as_slice() == Sha256::digest(payload_ciphertext).as_slice()
            && self.metadata_hash.as_slice() == Sha256::digest(metadata_ciphertext).as_slice()
    }

    /// JSON bytes for sealing.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    /// Parse claims from unsealed JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_bind_content() {
        let claims = Claims::over(
            Uuid::new_v4(),
            "a@example.com",
            vec![1; 32],
            b"payload ciphertext",
            b"metadata ciphertext",
            1_700_000_000,
        );

        assert!(claims.content_matches(b"payload ciphertext", b"metadata ciphertext"));
        assert!(!claims.content_matches(b"payload ciphertext!", b"metadata ciphertext"));
        assert!(!claims.content_matches(b"payload ciphertext", b"metadata tampered"));
    }

    #[test]
    fn json_roundtrip() {
        let claims = Claims::over(
            Uuid::new_v4(),
            "a@example.com",
            vec![7; 32],
            b"p",
            b"m",
            42,
        );

        let bytes = claims.to_bytes().unwrap();
        let back = Claims::from_bytes(&bytes).unwrap();

        assert_eq!(back.message, claims.message);
        assert_eq!(back.alias, claims.alias);
        assert_eq!(back.public_key, claims.public_key);
        assert_eq!(back.payload_hash, claims.payload_hash);
        assert_eq!(back.metadata_hash, claims.metadata_hash);
    }

    #[test]
    fn hash_length_is_sha256() {
        let claims = Claims::over(Uuid::new_v4(), "x@y.zz", vec![], b"a", b"b", 0);
        assert_eq!(claims.payload_hash.len(), 32);
        assert_eq!(claims.metadata_hash.len(), 32);
    }
}

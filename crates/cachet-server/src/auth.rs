//! Bearer-token request authentication.
//!
//! The token the server hands out at activation is its own sealed
//! statement `{issued, peer, alias}`; presenting it back is the whole
//! authentication handshake. Every failure mode on this path collapses to
//! `Unauthorized` on the wire - the distinctions exist only in logs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cachet_crypto::{open_secret, seal_secret, SealKey};

use crate::storage::{PeerRecord, Storage};
use crate::{Result, ServerEngine, ServerError};

/// The sealed contents of a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct BearerToken {
    /// Unix timestamp at issue.
    pub issued: i64,
    /// Peer id at issue.
    pub peer: Uuid,
    /// Alias the token authenticates.
    pub alias: String,
}

impl BearerToken {
    /// Issue a token for a freshly activated peer.
    pub fn issue(peer: &PeerRecord) -> Self {
        Self {
            issued: chrono::Utc::now().timestamp(),
            peer: peer.peer,
            alias: peer.alias.clone(),
        }
    }

    /// Seal under the server key and encode for the wire.
    pub fn seal(&self, key: &SealKey) -> Result<String> {
        let plaintext = serde_json::to_vec(self)
            .map_err(|e| ServerError::Internal(format!("token encode: {e}")))?;
        let sealed = seal_secret(&plaintext, key)?;
        Ok(STANDARD.encode(sealed))
    }

    /// Decode and open a presented token.
    pub fn open(token: &str, key: &SealKey) -> Result<Self> {
        let sealed = STANDARD
            .decode(token.as_bytes())
            .map_err(|_| ServerError::Unauthorized)?;
        let plaintext = open_secret(&sealed, key).map_err(|_| ServerError::Unauthorized)?;
        serde_json::from_slice(&plaintext).map_err(|_| ServerError::Unauthorized)
    }
}

impl<S: Storage> ServerEngine<S> {
    /// Authenticate a request from its bearer token.
    ///
    /// `token` is the base64 value carried after `Authorization: Bearer `.
    /// Returns the peer the request acts as; the transport layer attaches
    /// it to the request context.
    pub fn authenticate(&self, token: &str) -> Result<PeerRecord> {
        self.authenticate_at(token, chrono::Utc::now().timestamp())
    }

    /// Authentication with an explicit clock, for tests.
    pub fn authenticate_at(&self, token: &str, now: i64) -> Result<PeerRecord> {
        let bearer = BearerToken::open(token, self.keys().seal_key())?;

        let age = now - bearer.issued;
        if age < 0 || age > self.policy().bearer_max_age_secs {
            tracing::debug!(alias = %bearer.alias, age, "bearer token outside validity window");
            return Err(ServerError::Unauthorized);
        }

        let peer = self
            .storage()
            .peer_by_alias(self.keys().server_id(), &bearer.alias)?
            .ok_or(ServerError::Unauthorized)?;

        // The alias is the lookup key; the embedded peer id must agree
        // with the row it resolves to.
        if peer.peer != bearer.peer {
            tracing::warn!(alias = %bearer.alias, "bearer token peer id mismatch");
            return Err(ServerError::Unauthorized);
        }

        Ok(peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PeerRecord {
        PeerRecord {
            server: Uuid::new_v4(),
            peer: Uuid::new_v4(),
            alias: "a@example.com".into(),
            public_key: vec![1; 32],
        }
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = SealKey::generate();
        let peer = record();

        let sealed = BearerToken::issue(&peer).seal(&key).unwrap();
        let opened = BearerToken::open(&sealed, &key).unwrap();

        assert_eq!(opened.peer, peer.peer);
        assert_eq!(opened.alias, peer.alias);
    }

    #[test]
    fn wrong_key_is_unauthorized() {
        let peer = record();
        let sealed = BearerToken::issue(&peer).seal(&SealKey::generate()).unwrap();

        assert!(matches!(
            BearerToken::open(&sealed, &SealKey::generate()),
            Err(ServerError::Unauthorized)
        ));
    }

    #[test]
    fn garbage_is_unauthorized() {
        let key = SealKey::generate();
        assert!(matches!(
            BearerToken::open("not base64 !!", &key),
            Err(ServerError::Unauthorized)
        ));
        assert!(matches!(
            BearerToken::open("AAAA", &key),
            Err(ServerError::Unauthorized)
        ));
    }
}

//! Client-side view of one server.
//!
//! An endpoint pairs an alias with a server URL and holds everything the
//! client knows about that relationship: the server's public key learned
//! at enrolment, the endpoint's own public key, the ordered vault list
//! owning the private key and bearer token, and the directory of trusted
//! peers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cachet_crypto::{open_box, seal_box, BoxPublicKey, BoxSecretKey};
use cachet_proto::b64;

use crate::vault::{Vault, VaultStrategy, VAULT_KEY_PRIVATE, VAULT_KEY_TOKEN};
use crate::{ClientError, Result};

/// A trusted `(alias, public key)` pair in the peer directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    /// The peer's alias.
    pub alias: String,
    /// The peer's public box key.
    #[serde(with = "b64")]
    pub public_key: Vec<u8>,
}

/// One server as seen from the client.
///
/// There is a single canonical private key per endpoint - the key the
/// public key derives from - owned by the vaults; additional vaults are
/// alternate sealings of the same key, not independent copies.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Endpoint URL, always ending in `/`.
    pub url: String,
    /// Our alias at this server.
    pub alias: String,
    /// The server's public box key; empty until enrolment.
    #[serde(with = "b64")]
    pub server_key: Vec<u8>,
    /// Our public box key.
    #[serde(with = "b64")]
    pub public_key: Vec<u8>,
    /// Ordered vaults holding the private key and bearer token.
    pub vaults: Vec<Vault>,
    /// Trusted peers, at most one entry per alias.
    pub peers: BTreeMap<String, Peer>,
}

impl Endpoint {
    /// Create an endpoint with a fresh keypair stored in a new vault.
    pub fn create(alias: &str, url: &str, strategy: VaultStrategy) -> Result<Self> {
        validate_alias(alias)?;

        let url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };

        let secret = BoxSecretKey::generate();
        let mut vault = Vault::create(strategy, alias, &url)?;
        vault.set(VAULT_KEY_PRIVATE, secret.as_bytes())?;

        Ok(Self {
            url,
            alias: alias.to_string(),
            server_key: Vec::new(),
            public_key: secret.public_key().to_bytes().to_vec(),
            vaults: vec![vault],
            peers: BTreeMap::new(),
        })
    }

    /// Read a secret from the vaults.
    ///
    /// The first already-unsealed vault answers; otherwise the first
    /// vault is unsealed on demand.
    pub fn vault_get(&mut self, key: &str) -> Result<Vec<u8>> {
        if self.vaults.is_empty() {
            return Err(ClientError::Vault("endpoint has no vaults".into()));
        }

        if let Some(vault) = self.vaults.iter().find(|v| v.is_unsealed()) {
            return vault.get(key);
        }

        let first = &mut self.vaults[0];
        first.unseal()?;
        first.get(key)
    }

    /// Write a secret to the first vault.
    pub fn vault_set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let first = self
            .vaults
            .first_mut()
            .ok_or_else(|| ClientError::Vault("endpoint has no vaults".into()))?;
        if !first.is_unsealed() {
            first.unseal()?;
        }
        first.set(key, value)
    }

    /// The endpoint's private key, unsealed from the vaults.
    pub fn private_key(&mut self) -> Result<BoxSecretKey> {
        let bytes = self.vault_get(VAULT_KEY_PRIVATE)?;
        Ok(BoxSecretKey::from_bytes(&bytes)?)
    }

    /// The bearer token, or `NotActivated` if none is stored yet.
    pub fn bearer_token(&mut self) -> Result<String> {
        let bytes = self
            .vault_get(VAULT_KEY_TOKEN)
            .map_err(|_| ClientError::NotActivated)?;
        String::from_utf8(bytes).map_err(|_| ClientError::NotActivated)
    }

    /// The server's public key, or `NotEnrolled` before enrolment.
    pub fn server_public(&self) -> Result<BoxPublicKey> {
        if self.server_key.is_empty() {
            return Err(ClientError::NotEnrolled);
        }
        Ok(BoxPublicKey::from_bytes(&self.server_key)?)
    }

    /// Seal a plaintext to a peer key, authenticated as this endpoint.
    pub fn seal_to(&mut self, peer_key: &BoxPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
        let secret = self.private_key()?;
        Ok(seal_box(plaintext, peer_key, &secret)?)
    }

    /// Open a ciphertext sealed to this endpoint by `sender_key`.
    pub fn open_from(&mut self, sender_key: &BoxPublicKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let secret = self.private_key()?;
        Ok(open_box(ciphertext, sender_key, &secret)?)
    }

    /// A peer already in the directory.
    pub fn known_peer(&self, alias: &str) -> Option<&Peer> {
        self.peers.get(alias)
    }

    /// Insert or replace a directory entry.
    pub fn insert_peer(&mut self, peer: Peer) {
        self.peers.insert(peer.alias.clone(), peer);
    }

    /// Remove a directory entry; returns whether it existed.
    pub fn remove_peer(&mut self, alias: &str) -> bool {
        self.peers.remove(alias).is_some()
    }

    /// All directory entries, ordered by alias.
    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }
}

/// Validate an email-shaped alias: one `@`, a non-empty local part, and a
/// dotted domain, with no whitespace anywhere.
pub fn validate_alias(alias: &str) -> Result<()> {
    let invalid = || ClientError::InvalidAlias(alias.to_string());

    if alias.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = alias.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::create("a@example.com", "https://relay.example.com", VaultStrategy::Clear)
            .unwrap()
    }

    #[test]
    fn create_normalizes_url_and_generates_keys() {
        let endpoint = endpoint();
        assert_eq!(endpoint.url, "https://relay.example.com/");
        assert_eq!(endpoint.public_key.len(), 32);
        assert_eq!(endpoint.vaults.len(), 1);
    }

    #[test]
    fn private_key_matches_public() {
        let mut endpoint = endpoint();
        let secret = endpoint.private_key().unwrap();
        assert_eq!(
            secret.public_key().to_bytes().to_vec(),
            endpoint.public_key
        );
    }

    #[test]
    fn bearer_token_roundtrip() {
        let mut endpoint = endpoint();
        assert!(matches!(
            endpoint.bearer_token(),
            Err(ClientError::NotActivated)
        ));

        endpoint.vault_set(VAULT_KEY_TOKEN, b"dG9rZW4=").unwrap();
        assert_eq!(endpoint.bearer_token().unwrap(), "dG9rZW4=");
    }

    #[test]
    fn server_public_requires_enrolment() {
        let endpoint = endpoint();
        assert!(matches!(
            endpoint.server_public(),
            Err(ClientError::NotEnrolled)
        ));
    }

    #[test]
    fn seal_open_against_own_key() {
        let mut alice = endpoint();
        let mut bob =
            Endpoint::create("b@example.com", "https://relay.example.com", VaultStrategy::Clear)
                .unwrap();

        let bob_key = BoxPublicKey::from_bytes(&bob.public_key).unwrap();
        let alice_key = BoxPublicKey::from_bytes(&alice.public_key).unwrap();

        let sealed = alice.seal_to(&bob_key, b"psst").unwrap();
        assert_eq!(bob.open_from(&alice_key, &sealed).unwrap(), b"psst");
    }

    #[test]
    fn peer_directory_is_a_set() {
        let mut endpoint = endpoint();

        endpoint.insert_peer(Peer {
            alias: "b@example.com".into(),
            public_key: vec![1; 32],
        });
        endpoint.insert_peer(Peer {
            alias: "b@example.com".into(),
            public_key: vec![2; 32],
        });

        assert_eq!(endpoint.peers().count(), 1);
        assert_eq!(
            endpoint.known_peer("b@example.com").unwrap().public_key,
            vec![2; 32]
        );

        assert!(endpoint.remove_peer("b@example.com"));
        assert!(!endpoint.remove_peer("b@example.com"));
        assert!(endpoint.known_peer("b@example.com").is_none());
    }

    #[test]
    fn alias_validation() {
        validate_alias("a@example.com").unwrap();
        validate_alias("first.last@sub.example.org").unwrap();

        for bad in ["", "a", "@example.com", "a@", "a@example", "a b@x.com", "a@@x.com"] {
            assert!(validate_alias(bad).is_err(), "accepted {bad:?}");
        }
    }
}

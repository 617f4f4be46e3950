//! Server key material.
//!
//! A server carries a server id, an X25519 box keypair (claims sealing and
//! the public half handed to enrolling peers), an Ed25519 sign keypair
//! (challenge signing), and the 32-byte seal key under which it seals
//! activation and bearer tokens. Keys are generated once per server and
//! never rotate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cachet_crypto::{BoxPublicKey, BoxSecretKey, SealKey, SignPublicKey, SignSecretKey};
use cachet_proto::b64;

use crate::Result;

/// The full key set of one server.
pub struct ServerKeys {
    server_id: Uuid,
    box_secret: BoxSecretKey,
    box_public: BoxPublicKey,
    sign_secret: SignSecretKey,
    sign_public: SignPublicKey,
    seal_key: SealKey,
}

impl ServerKeys {
    /// Generate a fresh key set with a new server id.
    pub fn generate() -> Self {
        let box_secret = BoxSecretKey::generate();
        let box_public = box_secret.public_key();
        let sign_secret = SignSecretKey::generate();
        let sign_public = sign_secret.public_key();

        Self {
            server_id: Uuid::new_v4(),
            box_secret,
            box_public,
            sign_secret,
            sign_public,
            seal_key: SealKey::generate(),
        }
    }

    /// The opaque server id.
    pub fn server_id(&self) -> Uuid {
        self.server_id
    }

    /// Public box key, returned to peers on enrolment.
    pub fn box_public(&self) -> &BoxPublicKey {
        &self.box_public
    }

    /// Secret box key, used to seal claims to recipients.
    pub fn box_secret(&self) -> &BoxSecretKey {
        &self.box_secret
    }

    /// Public sign key, used to verify challenge solutions.
    pub fn sign_public(&self) -> &SignPublicKey {
        &self.sign_public
    }

    /// Secret sign key, used to issue challenges.
    pub fn sign_secret(&self) -> &SignSecretKey {
        &self.sign_secret
    }

    /// The server-local seal key.
    pub fn seal_key(&self) -> &SealKey {
        &self.seal_key
    }

    /// Export for operator storage.
    ///
    /// # Security
    ///
    /// The result contains every secret the server owns; store it
    /// accordingly.
    pub fn to_stored(&self) -> StoredServerKeys {
        StoredServerKeys {
            server: self.server_id,
            private_box_key: self.box_secret.as_bytes().to_vec(),
            public_box_key: self.box_public.to_bytes().to_vec(),
            private_sign_key: self.sign_secret.to_bytes().to_vec(),
            public_sign_key: self.sign_public.to_bytes().to_vec(),
            secret_box_key: self.seal_key.as_bytes().to_vec(),
        }
    }

    /// Restore from operator storage.
    pub fn from_stored(stored: &StoredServerKeys) -> Result<Self> {
        let box_secret = BoxSecretKey::from_bytes(&stored.private_box_key)?;
        let box_public = box_secret.public_key();
        let sign_secret = SignSecretKey::from_bytes(&stored.private_sign_key)?;
        let sign_public = sign_secret.public_key();

        Ok(Self {
            server_id: stored.server,
            box_secret,
            box_public,
            sign_secret,
            sign_public,
            seal_key: SealKey::from_bytes(&stored.secret_box_key)?,
        })
    }
}

impl std::fmt::Debug for ServerKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerKeys")
            .field("server_id", &self.server_id)
            .field("box_public", &self.box_public)
            .field("secrets", &"[REDACTED]")
            .finish()
    }
}

/// Serialized form of [`ServerKeys`] for operator storage.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredServerKeys {
    /// Server id.
    pub server: Uuid,
    /// X25519 secret key.
    #[serde(with = "b64")]
    pub private_box_key: Vec<u8>,
    /// X25519 public key.
    #[serde(with = "b64")]
    pub public_box_key: Vec<u8>,
    /// Ed25519 seed.
    #[serde(with = "b64")]
    pub private_sign_key: Vec<u8>,
    /// Ed25519 public key.
    #[serde(with = "b64")]
    pub public_sign_key: Vec<u8>,
    /// Symmetric seal key.
    #[serde(with = "b64")]
    pub secret_box_key: Vec<u8>,
}

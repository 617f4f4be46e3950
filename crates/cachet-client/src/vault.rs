//! Pluggable secret vaults.
//!
//! A vault is a keyed store of opaque byte values that may require an
//! unsealing step before reads work. Endpoints keep their private key
//! under [`VAULT_KEY_PRIVATE`] and the post-activation bearer token under
//! [`VAULT_KEY_TOKEN`].
//!
//! Two strategies exist. *Cleartext* keeps values inline in the config
//! document - not much of a vault, but necessary for tests and for
//! devices without any credential infrastructure. *Platform* keeps only
//! `{service, user}` metadata in the config and the values in the OS
//! credential store, fetched on [`Vault::unseal`].
//!
//! The serialized form is `{"strategy": ..., "properties": ...}`, so new
//! strategies can be added without disturbing stored configs.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::{ClientError, Result};

/// Vault slot for the endpoint's private box key.
pub const VAULT_KEY_PRIVATE: &str = "privateKey";

/// Vault slot for the endpoint's bearer token.
pub const VAULT_KEY_TOKEN: &str = "token";

/// Credential-store service name used by the platform strategy.
const PLATFORM_SERVICE: &str = "cachet.relay";

/// The strategy tag of a vault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultStrategy {
    /// Values inline, always unsealed.
    Clear,
    /// Values in the OS credential store.
    Platform,
}

/// A vault and its strategy-specific state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "properties", rename_all = "lowercase")]
pub enum Vault {
    /// Cleartext strategy.
    Clear(ClearVault),
    /// Platform credential-store strategy.
    Platform(PlatformVault),
}

impl Vault {
    /// Create a new vault of the given strategy for an endpoint.
    ///
    /// The platform strategy registers an (initially empty) entry in the
    /// credential store keyed by the service name and `"<alias>:<url>"`.
    pub fn create(strategy: VaultStrategy, alias: &str, url: &str) -> Result<Self> {
        match strategy {
            VaultStrategy::Clear => Ok(Vault::Clear(ClearVault::default())),
            VaultStrategy::Platform => Ok(Vault::Platform(PlatformVault::create(alias, url)?)),
        }
    }

    /// The strategy tag.
    pub fn strategy(&self) -> VaultStrategy {
        match self {
            Vault::Clear(_) => VaultStrategy::Clear,
            Vault::Platform(_) => VaultStrategy::Platform,
        }
    }

    /// Whether values can currently be read.
    pub fn is_unsealed(&self) -> bool {
        match self {
            Vault::Clear(_) => true,
            Vault::Platform(v) => v.values.is_some(),
        }
    }

    /// Make values readable. A no-op for the cleartext strategy.
    pub fn unseal(&mut self) -> Result<()> {
        match self {
            Vault::Clear(_) => Ok(()),
            Vault::Platform(v) => v.unseal(),
        }
    }

    /// Read a value.
    ///
    /// Fails with [`ClientError::VaultSealed`] before [`Vault::unseal`]
    /// on strategies that need it, and with a vault error when the key is
    /// absent.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        let values = match self {
            Vault::Clear(v) => &v.values,
            Vault::Platform(v) => v.values.as_ref().ok_or(ClientError::VaultSealed)?,
        };
        let encoded = values
            .get(key)
            .ok_or_else(|| ClientError::Vault(format!("no value for {key}")))?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| ClientError::Vault(format!("corrupt value for {key}: {e}")))
    }

    /// Write a value.
    pub fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let encoded = STANDARD.encode(value);
        match self {
            Vault::Clear(v) => {
                v.values.insert(key.to_string(), encoded);
                Ok(())
            }
            Vault::Platform(v) => v.set(key, encoded),
        }
    }
}

/// Cleartext vault state: the value map itself.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClearVault {
    /// Values, base64-encoded.
    pub values: BTreeMap<String, String>,
}

/// Platform vault state: only the credential-store coordinates persist;
/// the value map is cached after unsealing and never serialized.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformVault {
    /// Credential-store service.
    pub service: String,
    /// Credential-store user, `"<alias>:<url>"`.
    pub user: String,
    #[serde(skip)]
    values: Option<BTreeMap<String, String>>,
}

impl PlatformVault {
    fn create(alias: &str, url: &str) -> Result<Self> {
        let vault = Self {
            service: PLATFORM_SERVICE.to_string(),
            user: format!("{alias}:{url}"),
            values: Some(BTreeMap::new()),
        };
        vault.persist()?;
        Ok(vault)
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.user)
            .map_err(|e| ClientError::Vault(format!("credential store: {e}")))
    }

    fn unseal(&mut self) -> Result<()> {
        let secret = self
            .entry()?
            .get_password()
            .map_err(|e| ClientError::Vault(format!("credential store: {e}")))?;
        let values = serde_json::from_str(&secret)
            .map_err(|e| ClientError::Vault(format!("corrupt credential entry: {e}")))?;
        self.values = Some(values);
        Ok(())
    }

    fn set(&mut self, key: &str, encoded: String) -> Result<()> {
        let values = self.values.as_mut().ok_or(ClientError::VaultSealed)?;
        values.insert(key.to_string(), encoded);
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let values = self.values.as_ref().ok_or(ClientError::VaultSealed)?;
        let js = serde_json::to_string(values)
            .map_err(|e| ClientError::Vault(format!("encode values: {e}")))?;
        self.entry()?
            .set_password(&js)
            .map_err(|e| ClientError::Vault(format!("credential store: {e}")))
    }
}

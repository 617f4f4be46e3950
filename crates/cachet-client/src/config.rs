//! Client configuration.
//!
//! A single JSON document holding every endpoint and the client
//! properties. Saves are atomic: the new contents go to a temp file in
//! the same directory (mode 0600), are fsynced, then renamed over the
//! old document. The config is single-writer per process.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;
use crate::vault::VaultStrategy;
use crate::{ClientError, Result};

/// Current config document version.
pub const CONFIG_VERSION: u32 = 1;

/// Environment variable overriding the config store path.
pub const STORE_ENV: &str = "CACHET_STORE";

/// Client-wide properties.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    /// Index of the endpoint used when none is named.
    pub default_endpoint: usize,
    /// Whether unknown peers are trusted on first contact.
    pub accept_peers: bool,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            default_endpoint: 0,
            accept_peers: true,
        }
    }
}

/// The client configuration document.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Document version, for forward-compatibility checks.
    pub version: u32,
    /// Enrolled endpoints; index 0 is the default unless properties say
    /// otherwise.
    pub endpoints: Vec<Endpoint>,
    /// Client-wide properties.
    pub properties: Properties,

    #[serde(skip)]
    store: PathBuf,
    #[serde(skip)]
    modified: bool,
}

impl Config {
    /// The store path, honoring the environment override.
    pub fn store_path(fallback: impl Into<PathBuf>) -> PathBuf {
        std::env::var_os(STORE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| fallback.into())
    }

    /// Load the config, or start a fresh one if the store doesn't exist.
    pub fn load(store: impl Into<PathBuf>) -> Result<Self> {
        let store = store.into();

        let contents = match fs::read(&store) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    version: CONFIG_VERSION,
                    endpoints: Vec::new(),
                    properties: Properties::default(),
                    store,
                    modified: true,
                });
            }
            Err(e) => return Err(ClientError::Config(format!("read {store:?}: {e}"))),
        };

        let mut config: Config = serde_json::from_slice(&contents)
            .map_err(|e| ClientError::Config(format!("parse {store:?}: {e}")))?;

        if config.version > CONFIG_VERSION {
            return Err(ClientError::Config(format!(
                "config version {} is newer than this client understands; please upgrade",
                config.version
            )));
        }

        config.store = store;
        config.modified = false;
        Ok(config)
    }

    /// Mark the config as needing a save.
    pub fn touch(&mut self) {
        self.modified = true;
    }

    /// Whether there are unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Save if modified. Atomic: temp file, 0600, fsync, rename.
    pub fn save(&mut self) -> Result<()> {
        if !self.modified {
            return Ok(());
        }
        self.atomic_save()?;
        self.modified = false;
        Ok(())
    }

    fn atomic_save(&self) -> Result<()> {
        let io = |what: &'static str| {
            let store = self.store.clone();
            move |e: std::io::Error| ClientError::Config(format!("{what} {store:?}: {e}"))
        };

        let mut contents = serde_json::to_vec_pretty(self)
            .map_err(|e| ClientError::Config(format!("encode config: {e}")))?;
        contents.push(b'\n');

        let dir = self.store.parent().unwrap_or_else(|| Path::new("."));
        let tmp = dir.join(format!(
            ".tmp-{}",
            self.store
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("config")
        ));

        let mut file = fs::File::create(&tmp).map_err(io("create temp for"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(io("chmod temp for"))?;
        }

        let result = file
            .write_all(&contents)
            .and_then(|_| file.sync_all())
            .map_err(io("write temp for"))
            .and_then(|_| {
                drop(file);
                fs::rename(&tmp, &self.store).map_err(io("replace"))
            });

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    /// Find an endpoint by `(alias, url)`.
    pub fn endpoint(&self, alias: &str, url: &str) -> Option<usize> {
        self.endpoints
            .iter()
            .position(|e| e.alias == alias && e.url == url)
    }

    /// The default endpoint, if any exist.
    pub fn default_endpoint(&mut self) -> Option<&mut Endpoint> {
        let index = self.properties.default_endpoint.min(
            self.endpoints.len().checked_sub(1)?,
        );
        self.endpoints.get_mut(index)
    }

    /// Add an endpoint with a fresh keypair, making it the default.
    ///
    /// Replacing an existing `(alias, url)` enrolment requires `force`.
    pub fn add_endpoint(
        &mut self,
        alias: &str,
        url: &str,
        strategy: VaultStrategy,
        force: bool,
    ) -> Result<&mut Endpoint> {
        let endpoint = Endpoint::create(alias, url, strategy)?;

        if let Some(existing) = self.endpoint(alias, &endpoint.url) {
            if !force {
                return Err(ClientError::Conflict(format!(
                    "{alias} at {url}; use force to replace"
                )));
            }
            self.endpoints.remove(existing);
        }

        self.endpoints.push(endpoint);
        self.properties.default_endpoint = self.endpoints.len() - 1;
        self.modified = true;

        Ok(self.endpoints.last_mut().expect("endpoint just pushed"))
    }

    /// Remove an endpoint by `(alias, url)`; returns whether it existed.
    pub fn remove_endpoint(&mut self, alias: &str, url: &str) -> bool {
        match self.endpoint(alias, url) {
            Some(index) => {
                self.endpoints.remove(index);
                if self.properties.default_endpoint >= self.endpoints.len() {
                    self.properties.default_endpoint = 0;
                }
                self.modified = true;
                true
            }
            None => false,
        }
    }
}

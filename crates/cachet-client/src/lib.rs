//! # cachet-client
//!
//! The client half of the cachet relay protocol. The client is Sans-IO:
//! every network operation goes through the [`transport::Transport`] seam,
//! so the engine can be driven by a real HTTP client or an in-process
//! server without changing a line here.
//!
//! State lives in a single JSON [`config::Config`] saved atomically. Each
//! [`endpoint::Endpoint`] in it carries the peer's alias at one server,
//! the server's public key, a directory of trusted peers, and an ordered
//! list of [`vault::Vault`]s holding the private key and bearer token.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod endpoint;
pub mod error;
pub mod ops;
pub mod transport;
pub mod vault;

pub use config::{Config, Properties};
pub use endpoint::{Endpoint, Peer};
pub use error::{ClientError, Result};
pub use ops::{FetchedMessage, InboxEntry, SendReceipt};
pub use transport::{Transport, TransportError};
pub use vault::{Vault, VaultStrategy, VAULT_KEY_PRIVATE, VAULT_KEY_TOKEN};

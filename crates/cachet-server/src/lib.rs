//! # cachet-server
//!
//! The server half of the cachet relay protocol, kept free of transport
//! concerns: every handler is a typed method on [`ServerEngine`], and an
//! HTTP layer (not part of this crate) maps request paths onto them and
//! [`ServerError::status`] onto response codes - exactly once.
//!
//! The engine owns the server's key material ([`keys::ServerKeys`]), talks
//! to durable state through the [`storage::Storage`] contract, and hands
//! activation notices to an [`mailer::ActivationMailer`] for out-of-band
//! delivery. Hostname-based dispatch across servers lives in
//! [`registry::Registry`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod engine;
mod enrol;
mod message;

pub mod error;
pub mod keys;
pub mod mailer;
pub mod registry;
pub mod storage;

pub use auth::BearerToken;
pub use engine::{ServerEngine, ServerPolicy};
pub use enrol::ActivationToken;
pub use error::{Result, ServerError};
pub use keys::ServerKeys;
pub use mailer::{ActivationMailer, ActivationNotice, LogMailer, MemoryMailer};
pub use registry::Registry;
pub use storage::{MemoryStorage, MessageSelector, PeerRecord, Storage, StoredMessage};
